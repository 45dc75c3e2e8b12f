//! What a command line produces, and the control tokens that carry actions
//! across the browser boundary.

use std::fmt;

use crate::error::ShellError;

/// External mini-programs the terminal can launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Program {
    /// Difficulty 0 (easy) to 2 (hard), or the game's own default
    Doom(Option<u8>),
    Screensaver,
    Grace,
    Snake,
}

impl Program {
    fn id(self) -> String {
        match self {
            Program::Doom(None) => "DOOM".to_string(),
            Program::Doom(Some(level)) => format!("DOOM:{}", level),
            Program::Screensaver => "SCREENSAVER".to_string(),
            Program::Grace => "GRACE".to_string(),
            Program::Snake => "SNAKE".to_string(),
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        match id {
            "DOOM" => Some(Program::Doom(None)),
            "SCREENSAVER" => Some(Program::Screensaver),
            "GRACE" => Some(Program::Grace),
            "SNAKE" => Some(Program::Snake),
            _ => {
                let level = id.strip_prefix("DOOM:")?.parse().ok()?;
                Some(Program::Doom(Some(level)))
            }
        }
    }
}

/// Something the engine asks its host to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Clear,
    Exit,
    Reboot,
    KernelPanic(String),
    Open(String),
    Nano { filename: String, content: String },
    Launch(Program),
    Fetch(String),
    Curl {
        method: String,
        show_headers: bool,
        url: String,
    },
    Ping(String),
    Dns(String),
    MyIp,
    PythonRepl,
    ExitPython,
}

impl Action {
    /// Wire form of the action.
    pub fn token(&self) -> String {
        match self {
            Action::Clear => "CLEAR".to_string(),
            Action::Exit => "EXIT".to_string(),
            Action::Reboot => "REBOOT".to_string(),
            Action::KernelPanic(message) => format!("KERNEL_PANIC:{}", message),
            Action::Open(url) => format!("OPEN:{}", url),
            Action::Nano { filename, content } => {
                let filename = escape(filename).replace(':', "\\:");
                format!("NANO:{}:{}", filename, escape(content))
            }
            Action::Launch(program) => format!("LAUNCH_{}", program.id()),
            Action::Fetch(url) => format!("FETCH:{}", url),
            Action::Curl {
                method,
                show_headers,
                url,
            } => format!("CURL:{}:{}:{}", method, show_headers, url),
            Action::Ping(host) => format!("PING:{}", host),
            Action::Dns(host) => format!("DNS:{}", host),
            Action::MyIp => "MYIP".to_string(),
            Action::PythonRepl => "PYTHON_REPL".to_string(),
            Action::ExitPython => "EXIT_PYTHON".to_string(),
        }
    }

    /// Parse a wire token. Anything else is `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "CLEAR" => return Some(Action::Clear),
            "EXIT" => return Some(Action::Exit),
            "REBOOT" => return Some(Action::Reboot),
            "MYIP" => return Some(Action::MyIp),
            "PYTHON_REPL" => return Some(Action::PythonRepl),
            "EXIT_PYTHON" => return Some(Action::ExitPython),
            _ => {}
        }

        if let Some(id) = token.strip_prefix("LAUNCH_") {
            return Program::from_id(id).map(Action::Launch);
        }

        let (kind, rest) = token.split_once(':')?;
        match kind {
            "KERNEL_PANIC" => Some(Action::KernelPanic(rest.to_string())),
            "OPEN" => Some(Action::Open(rest.to_string())),
            "FETCH" => Some(Action::Fetch(rest.to_string())),
            "PING" => Some(Action::Ping(rest.to_string())),
            "DNS" => Some(Action::Dns(rest.to_string())),
            "NANO" => {
                let (filename, content) = split_unescaped_colon(rest)?;
                Some(Action::Nano {
                    filename: unescape(filename),
                    content: unescape(content),
                })
            }
            "CURL" => {
                let mut parts = rest.splitn(3, ':');
                let method = parts.next()?.to_string();
                let show_headers = parts.next()?.parse().ok()?;
                let url = parts.next()?.to_string();
                Some(Action::Curl {
                    method,
                    show_headers,
                    url,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Escape NANO text so it fits on one line. Filenames additionally get
/// `\:` for every colon.
fn escape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(':') => out.push(':'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split at the first colon not escaped with a backslash.
fn split_unescaped_colon(text: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ':' => return Some((&text[..i], &text[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Result of one `exec` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// Text for the transcript, possibly empty
    Text(String),
    /// A request for the host
    Action(Action),
    /// A failure, printed as its `Display`
    Failed(ShellError),
}

impl Output {
    pub fn text(text: impl Into<String>) -> Self {
        Output::Text(text.into())
    }

    pub fn empty() -> Self {
        Output::Text(String::new())
    }

    /// The string the terminal shows or interprets.
    pub fn render(&self) -> String {
        match self {
            Output::Text(text) => text.clone(),
            Output::Action(action) => action.token(),
            Output::Failed(err) => err.to_string(),
        }
    }

    pub fn action(&self) -> Option<&Action> {
        match self {
            Output::Action(action) => Some(action),
            _ => None,
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Output::Failed(err) if err.is_unrecognized())
    }
}

impl From<Action> for Output {
    fn from(action: Action) -> Self {
        Output::Action(action)
    }
}

impl From<ShellError> for Output {
    fn from(err: ShellError) -> Self {
        Output::Failed(err)
    }
}
