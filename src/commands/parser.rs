//! Prefix detection and tokenizing of incoming messages.

/// A message addressed to the bot, split into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The prefix the sender used, exactly as typed
    pub prefix: String,
    /// Whitespace separated words following the prefix
    pub words: Vec<String>,
    /// Everything following the prefix, spacing untouched
    pub text: String,
}

impl Invocation {
    /// The text left after the first `skip` words, trimmed at both ends.
    ///
    /// Inner spacing is kept as typed, so a help reference is reported back
    /// exactly as the user wrote it.
    pub fn text_after(&self, skip: usize) -> &str {
        let mut rest = self.text.as_str();
        for _ in 0..skip {
            rest = rest.trim_start();
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            rest = &rest[end..];
        }
        rest.trim()
    }
}

/// Recognizes the prefixes the bot answers to.
///
/// Three forms are accepted, tried in this order:
/// - the configured default prefix, e.g. `!pb `
/// - the canonical mention, e.g. `@profilebot:example.com `
/// - the nickname mention most clients insert, e.g. `ProfileBot: `
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefixes: Vec<String>,
}

impl PrefixMatcher {
    pub fn new(default_prefix: &str, bot_user_id: &str, display_name: &str) -> Self {
        let mut prefixes = vec![
            default_prefix.to_owned(),
            format!("{} ", bot_user_id),
            format!("{}: ", display_name),
        ];
        prefixes.retain(|prefix| !prefix.trim().is_empty());
        PrefixMatcher { prefixes }
    }

    /// Returns the invocation carried by `body`, or `None` if the message is
    /// not for the bot.
    ///
    /// A bare prefix (`!pb` with no command) yields an invocation without
    /// words, which the commander treats as a help request.
    pub fn parse(&self, body: &str) -> Option<Invocation> {
        let body = body.trim_start();

        self.prefixes.iter().find_map(|prefix| {
            let rest = match body.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None if body.trim_end() == prefix.trim_end() => "",
                None => return None,
            };

            Some(Invocation {
                prefix: prefix.clone(),
                words: rest.split_whitespace().map(str::to_owned).collect(),
                text: rest.to_owned(),
            })
        })
    }
}
