//! Key normalization.
//!
//! Host key events are turned into canonical tokens written in the familiar
//! `<C-a>` notation, so the rest of the engine never sees platform quirks.
//! The same notation is accepted from users when they write mappings.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A canonical key token: `x`, `<Space>`, `<C-w>`, `<Esc>`, `<S-Tab>`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// The token typed by a printable character.
    pub fn char(c: char) -> Self {
        match char_name(c) {
            Some(name) => Self(format!("<{name}>")),
            None => Self(c.to_string()),
        }
    }

    pub fn esc() -> Self {
        Self("<Esc>".to_string())
    }

    pub fn enter() -> Self {
        Self("<CR>".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The character this key types, for keys that type one.
    pub fn as_char(&self) -> Option<char> {
        match self.0.as_str() {
            "<Space>" => Some(' '),
            "<lt>" => Some('<'),
            "<Bslash>" => Some('\\'),
            s => {
                let mut chars = s.chars();
                let c = chars.next()?;
                chars.next().is_none().then_some(c)
            }
        }
    }

    /// The decimal digit this key types, if any.
    pub fn digit(&self) -> Option<u32> {
        self.as_char().and_then(|c| c.to_digit(10))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert a host key event into a canonical key.
///
/// Returns `None` for events that carry no editing meaning: key releases,
/// bare modifier presses, media keys and the like.
pub fn normalize(event: &KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let mods = Modifiers::from(event.modifiers);
    let base = match event.code {
        KeyCode::Char(c) => Base::Char(c),
        KeyCode::Enter => Base::Named("CR"),
        KeyCode::Esc => Base::Named("Esc"),
        KeyCode::Backspace => Base::Named("BS"),
        KeyCode::Tab => Base::Named("Tab"),
        KeyCode::BackTab => {
            return Some(build(
                Base::Named("Tab"),
                Modifiers {
                    shift: true,
                    ..mods
                },
            ));
        }
        KeyCode::Delete => Base::Named("Del"),
        KeyCode::Insert => Base::Named("Insert"),
        KeyCode::Home => Base::Named("Home"),
        KeyCode::End => Base::Named("End"),
        KeyCode::PageUp => Base::Named("PageUp"),
        KeyCode::PageDown => Base::Named("PageDown"),
        KeyCode::Up => Base::Named("Up"),
        KeyCode::Down => Base::Named("Down"),
        KeyCode::Left => Base::Named("Left"),
        KeyCode::Right => Base::Named("Right"),
        KeyCode::F(n) => Base::Function(n),
        _ => return None,
    };
    Some(build(base, mods))
}

/// Parse a key sequence written in key notation (`jk`, `<C-w>h`, `<esc>`).
///
/// Angle-bracket groups that do not name a key are taken literally, one
/// character at a time.
pub fn parse_keys(notation: &str) -> Vec<Key> {
    let mut keys = Vec::new();
    let mut rest = notation;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest.find('>') {
                if let Some(key) = parse_named(&rest[1..end]) {
                    keys.push(key);
                    rest = &rest[end + 1..];
                    continue;
                }
            }
        }
        keys.push(Key::char(c));
        rest = &rest[c.len_utf8()..];
    }
    keys
}

/// Render keys back into notation. Inverse of [`parse_keys`].
pub fn render_keys(keys: &[Key]) -> String {
    keys.iter().map(Key::as_str).collect()
}

#[derive(Debug, Clone, Copy)]
enum Base {
    Char(char),
    Named(&'static str),
    Function(u8),
}

#[derive(Debug, Clone, Copy, Default)]
struct Modifiers {
    ctrl: bool,
    alt: bool,
    sup: bool,
    shift: bool,
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        Self {
            ctrl: mods.contains(KeyModifiers::CONTROL),
            alt: mods.intersects(KeyModifiers::ALT | KeyModifiers::META),
            sup: mods.intersects(KeyModifiers::SUPER | KeyModifiers::HYPER),
            shift: mods.contains(KeyModifiers::SHIFT),
        }
    }
}

impl Modifiers {
    fn prefix(self, with_shift: bool) -> String {
        let mut prefix = String::new();
        if self.ctrl {
            prefix.push_str("C-");
        }
        if self.alt {
            prefix.push_str("M-");
        }
        if self.sup {
            prefix.push_str("D-");
        }
        if with_shift && self.shift {
            prefix.push_str("S-");
        }
        prefix
    }
}

fn char_name(c: char) -> Option<&'static str> {
    match c {
        ' ' => Some("Space"),
        '<' => Some("lt"),
        '\\' => Some("Bslash"),
        _ => None,
    }
}

fn build(base: Base, mods: Modifiers) -> Key {
    match base {
        Base::Char(c) => {
            // Shift is already folded into the character itself.
            if !mods.ctrl && !mods.alt && !mods.sup {
                return Key::char(c);
            }
            let c = if mods.ctrl { c.to_ascii_lowercase() } else { c };
            let name = char_name(c).map_or_else(|| c.to_string(), str::to_string);
            Key(format!("<{}{name}>", mods.prefix(false)))
        }
        Base::Named(name) => Key(format!("<{}{name}>", mods.prefix(true))),
        Base::Function(n) => Key(format!("<{}F{n}>", mods.prefix(true))),
    }
}

fn parse_named(inner: &str) -> Option<Key> {
    let mut mods = Modifiers::default();
    let mut body = inner;
    while body.len() > 2 && body.as_bytes()[1] == b'-' {
        match body.as_bytes()[0].to_ascii_uppercase() {
            b'C' => mods.ctrl = true,
            b'M' | b'A' => mods.alt = true,
            b'D' => mods.sup = true,
            b'S' => mods.shift = true,
            _ => break,
        }
        body = &body[2..];
    }

    let lower = body.to_ascii_lowercase();
    let base = match lower.as_str() {
        "esc" => Base::Named("Esc"),
        "cr" | "enter" | "return" => Base::Named("CR"),
        "bs" | "backspace" => Base::Named("BS"),
        "tab" => Base::Named("Tab"),
        "del" | "delete" => Base::Named("Del"),
        "insert" => Base::Named("Insert"),
        "home" => Base::Named("Home"),
        "end" => Base::Named("End"),
        "pageup" => Base::Named("PageUp"),
        "pagedown" => Base::Named("PageDown"),
        "up" => Base::Named("Up"),
        "down" => Base::Named("Down"),
        "left" => Base::Named("Left"),
        "right" => Base::Named("Right"),
        "space" => Base::Char(' '),
        "lt" => Base::Char('<'),
        "bslash" => Base::Char('\\'),
        "bar" => Base::Char('|'),
        _ => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=12).contains(&n) {
                    return Some(build(Base::Function(n), mods));
                }
                return None;
            }
            let mut chars = body.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            // `<x>` alone is not notation for anything.
            if !mods.ctrl && !mods.alt && !mods.sup && !mods.shift {
                return None;
            }
            Base::Char(c)
        }
    };
    Some(build(base, mods))
}
