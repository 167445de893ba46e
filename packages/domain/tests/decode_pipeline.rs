use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use voice_synth_domain::prelude::*;
use voice_synth_domain::{build_from_pcm, pcm};

fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[test]
fn base64_service_payload_becomes_two_second_buffer() {
    let samples: Vec<i16> = (0..48_000).map(|i| ((i % 200) as i16 - 100) * 300).collect();
    let payload = STANDARD.encode(pcm_bytes(&samples));

    let buffer = build_from_pcm(
        payload.as_bytes(),
        ByteEncoding::Base64,
        PcmFormat::GEMINI_OUTPUT,
    )
    .expect("valid payload");

    assert_eq!(buffer.sample_rate(), 24_000);
    assert_eq!(buffer.channel_count(), 1);
    assert_eq!(buffer.len() % buffer.channel_count() as usize, 0);
    assert!((buffer.duration_seconds() - 2.0).abs() < 1e-9);
    assert_eq!(buffer.sample(0, 1), Some(-99.0 * 300.0 / 32768.0));
}

#[test]
fn concatenated_chunks_decode_like_one_chunk() {
    let first = AudioChunk::new(vec![0x01, 0x02], 0);
    let second = AudioChunk::new(vec![0x03, 0x04], 1);
    let joined: Vec<u8> = [first, second]
        .into_iter()
        .flat_map(AudioChunk::into_bytes)
        .collect();

    assert_eq!(
        pcm::decode_pcm16le(&joined).unwrap(),
        pcm::decode_pcm16le(&[0x01, 0x02, 0x03, 0x04]).unwrap()
    );
}

#[test]
fn odd_payload_never_builds() {
    let payload = STANDARD.encode([0x01u8, 0x02, 0x03]);
    let err = build_from_pcm(
        payload.as_bytes(),
        ByteEncoding::Base64,
        PcmFormat::GEMINI_OUTPUT,
    )
    .unwrap_err();
    assert!(matches!(err, VoiceError::MalformedAudio(_)));
}
