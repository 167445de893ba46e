//! `Name: message` conversation scripts.

/// One speaker-tagged line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// `None` for text that appears before the first tagged line.
    pub speaker: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationScript {
    lines: Vec<ScriptLine>,
}

impl ConversationScript {
    /// Split a script into speaker-tagged lines.
    ///
    /// Blank lines are skipped. A line without a `Name:` prefix continues the
    /// previous speaker's line.
    pub fn parse(text: &str) -> Self {
        let mut lines: Vec<ScriptLine> = Vec::new();

        for raw in text.lines() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            match split_tag(raw) {
                Some((speaker, body)) => lines.push(ScriptLine {
                    speaker: Some(speaker.to_string()),
                    text: body.to_string(),
                }),
                None => match lines.last_mut() {
                    Some(last) => {
                        if !last.text.is_empty() {
                            last.text.push(' ');
                        }
                        last.text.push_str(raw);
                    }
                    None => lines.push(ScriptLine {
                        speaker: None,
                        text: raw.to_string(),
                    }),
                },
            }
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Distinct speaker names in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for name in self.lines.iter().filter_map(|l| l.speaker.as_deref()) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Speakers that appear in the script but not in `known`.
    pub fn unknown_speakers<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        self.speakers()
            .into_iter()
            .filter(|name| !known.iter().any(|k| k.eq_ignore_ascii_case(name)))
            .collect()
    }
}

fn split_tag(line: &str) -> Option<(&str, &str)> {
    let (speaker, body) = line.split_once(':')?;
    let speaker = speaker.trim();
    if speaker.is_empty() {
        return None;
    }
    Some((speaker, body.trim()))
}
