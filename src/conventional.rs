use regex::Regex;

/// Semantic-version change magnitude implied by a single change.
///
/// Ordered so that `max` picks the strongest bump when several records touch
/// the same package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpLevel {
    None,
    Patch,
    Minor,
    Major,
}

impl BumpLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpLevel::None => "none",
            BumpLevel::Patch => "patch",
            BumpLevel::Minor => "minor",
            BumpLevel::Major => "major",
        }
    }

    pub fn parse(value: &str) -> Option<BumpLevel> {
        match value.trim() {
            "none" => Some(BumpLevel::None),
            "patch" => Some(BumpLevel::Patch),
            "minor" => Some(BumpLevel::Minor),
            "major" => Some(BumpLevel::Major),
            _ => None,
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedChange {
    pub bump: BumpLevel,
    pub scope: Option<String>,
    pub description: String,
}

struct Header {
    r#type: String,
    scope: Option<String>,
    breaking_marker: bool,
    subject: String,
}

/// Parse the first line as `type(scope)!: subject`.
///
/// A space after the colon is required; a colon glued to the subject makes the
/// whole header unparsable. Scope may hold anything but parentheses, so an
/// unbalanced `(` also fails the match.
fn parse_header(header: &str) -> Option<Header> {
    let re = Regex::new(r"^(\w+)(?:\(([^)]*)\))?(!?)\s*:\s+(.+)$").ok()?;
    let captures = re.captures(header)?;

    let r#type = captures.get(1)?.as_str().to_string();
    let scope = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty());
    let breaking_marker = captures.get(3).map(|m| m.as_str()) == Some("!");
    let subject = captures.get(4)?.as_str().to_string();

    Some(Header {
        r#type,
        scope,
        breaking_marker,
        subject,
    })
}

fn footer_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("BREAKING CHANGE:")
        .or_else(|| trimmed.strip_prefix("BREAKING-CHANGE:"))
}

/// Extract the first `BREAKING CHANGE` footer from the body.
///
/// The header line never counts, even if it carries the token. When several
/// footers exist only the first one is used; its text runs until the next
/// footer or the end of the message.
fn breaking_footer(message: &str) -> Option<String> {
    let body: Vec<&str> = message.lines().skip(1).collect();
    let start = body.iter().position(|line| footer_text(line).is_some())?;

    let mut text = vec![footer_text(body[start]).unwrap_or_default().to_string()];
    for line in &body[start + 1..] {
        if footer_text(line).is_some() {
            break;
        }
        text.push((*line).to_string());
    }

    Some(text.join("\n").trim().to_string())
}

/// Classify a commit message into a bump level, scope and description.
///
/// Total over all inputs: anything that does not fit the conventional-commit
/// grammar degrades to `{none, no scope, entire original message}` instead of
/// failing.
pub fn classify(message: &str) -> ClassifiedChange {
    let header = parse_header(message.lines().next().unwrap_or(""));

    // Breaking-change precedence beats the type table.
    if let Some(note) = breaking_footer(message) {
        let (scope, subject) = match &header {
            Some(h) => (h.scope.clone(), h.subject.clone()),
            None => (None, message.to_string()),
        };
        let description = if note.is_empty() { subject } else { note };
        return ClassifiedChange {
            bump: BumpLevel::Major,
            scope,
            description,
        };
    }

    let Some(header) = header else {
        return ClassifiedChange {
            bump: BumpLevel::None,
            scope: None,
            description: message.to_string(),
        };
    };

    if header.breaking_marker {
        // `!` with no footer: the scope is intentionally dropped.
        return ClassifiedChange {
            bump: BumpLevel::Major,
            scope: None,
            description: header.subject,
        };
    }

    let bump = match header.r#type.as_str() {
        "feat" => BumpLevel::Minor,
        "fix" | "perf" | "revert" => BumpLevel::Patch,
        "build" | "chore" | "ci" | "docs" | "refactor" | "style" | "test" => BumpLevel::None,
        _ => {
            // Unknown type: pass the raw message through untouched.
            return ClassifiedChange {
                bump: BumpLevel::None,
                scope: None,
                description: message.to_string(),
            };
        }
    };

    ClassifiedChange {
        bump,
        scope: header.scope,
        description: header.subject,
    }
}
