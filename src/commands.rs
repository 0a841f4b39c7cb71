//! Inbound command surface.
//!
//! Messages are plain text lines; anything that does not start with a known
//! `.`-prefix is silently ignored. Matching is case-insensitive on the
//! prefix while arguments keep their original casing (minus a few brace
//! characters some chat clients wrap pasted content in).

/// The lookup a command resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Delivery,
    Internet,
    Ruc,
    Dni,
}

impl CommandKind {
    /// Wire token used by the peer scraping service.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Help => "help",
            CommandKind::Delivery => "delivery",
            CommandKind::Internet => "internet",
            CommandKind::Ruc => "ruc",
            CommandKind::Dni => "dni",
        }
    }
}

/// One parsed inbound command. Immutable; dropped once processed.
#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub args: String,
    /// Opaque reply handle the messenger understands (chat id, etc.).
    pub reply_to: String,
}

/// Longest prefixes first so `.help` is never shadowed by a shorter token.
const PREFIXES: &[(&str, CommandKind)] = &[
    (".delivery", CommandKind::Delivery),
    (".internet", CommandKind::Internet),
    (".ayuda", CommandKind::Help),
    (".help", CommandKind::Help),
    (".ruc", CommandKind::Ruc),
    (".dni", CommandKind::Dni),
    (".!", CommandKind::Help),
];

/// Parse an inbound text line into a [`Command`].
///
/// Returns `None` for anything that is not a known command; those messages
/// get no reply at all.
pub fn parse(text: &str, reply_to: &str) -> Option<Command> {
    let text = text.trim();
    if !text.starts_with('.') {
        return None;
    }
    let lowered = text.to_lowercase();
    for (prefix, kind) in PREFIXES {
        if lowered.starts_with(prefix) {
            let args = text[prefix.len()..]
                .trim()
                .replace(['{', '}', '[', ']'], "");
            return Some(Command {
                kind: *kind,
                args,
                reply_to: reply_to.to_string(),
            });
        }
    }
    None
}

/// Interim acknowledgment pushed before the lookup starts. Help resolves
/// instantly and gets none.
pub fn ack_message(kind: CommandKind) -> Option<&'static str> {
    match kind {
        CommandKind::Help => None,
        CommandKind::Delivery => Some("⏳ Consultando cobertura de delivery..."),
        CommandKind::Internet => Some("⏳ Consultando cobertura de internet..."),
        CommandKind::Ruc => Some("⏳ Consultando RUC...\nEspera un momento..."),
        CommandKind::Dni => Some("⏳ Consultando DNI en RENIEC..."),
    }
}

pub fn help_text() -> &'static str {
    "*Bot de Cobertura*\n\n\
     *Comandos:*\n\n\
     *.!* - Mostrar esta ayuda\n\n\
     *.delivery lat, lng*\n\
     Ejemplo: .delivery -12.046, -77.042\n\n\
     *.internet lat, lng*\n\
     Ejemplo: .internet -12.046, -77.042\n\n\
     *.ruc NUMERO_RUC*\n\
     Ejemplo: .ruc 20123456789\n\n\
     *.dni NUMERO_DNI*\n\
     Ejemplo: .dni 12345678\n\n\
     _Coordenadas de Google Maps_"
}

pub const DELIVERY_USAGE: &str = "*Formato incorrecto*\n\n\
    Uso: .delivery lat, lng\n\
    Ejemplo: .delivery -12.046, -77.042";

pub const INTERNET_USAGE: &str = "*Formato incorrecto*\n\n\
    Uso: .internet lat, lng\n\
    Ejemplo: .internet -12.046, -77.042";

pub const RUC_USAGE: &str = "*Formato incorrecto*\n\n\
    Uso: .ruc NUMERO_RUC\n\
    Ejemplo: .ruc 20123456789\n\n\
    _El RUC debe tener 11 dígitos_";

pub const DNI_USAGE: &str = "*Formato incorrecto*\n\n\
    Uso: .dni NUMERO_DNI\n\
    Ejemplo: .dni 12345678\n\n\
    _El DNI debe tener 8 dígitos_";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_prefixes() {
        let cmd = parse(".delivery -12.046, -77.042", "chat-1").unwrap();
        assert_eq!(cmd.kind, CommandKind::Delivery);
        assert_eq!(cmd.args, "-12.046, -77.042");
        assert_eq!(cmd.reply_to, "chat-1");

        assert_eq!(parse(".ruc 20123456789", "c").unwrap().kind, CommandKind::Ruc);
        assert_eq!(parse(".dni 12345678", "c").unwrap().kind, CommandKind::Dni);
        assert_eq!(parse(".internet 1, 2", "c").unwrap().kind, CommandKind::Internet);
    }

    #[test]
    fn help_aliases() {
        for text in [".!", ".help", ".ayuda", ".HELP"] {
            assert_eq!(parse(text, "c").unwrap().kind, CommandKind::Help);
        }
    }

    #[test]
    fn prefix_match_is_case_insensitive_and_args_keep_case() {
        let cmd = parse(".RUC 20123456789", "c").unwrap();
        assert_eq!(cmd.kind, CommandKind::Ruc);
        assert_eq!(cmd.args, "20123456789");
    }

    #[test]
    fn braces_are_stripped_from_args() {
        let cmd = parse(".delivery {-12.0, -77.0}", "c").unwrap();
        assert_eq!(cmd.args, "-12.0, -77.0");
    }

    #[test]
    fn unknown_prefixes_are_ignored() {
        assert!(parse("hello there", "c").is_none());
        assert!(parse(".unknown 1", "c").is_none());
        assert!(parse("", "c").is_none());
        assert!(parse("delivery 1, 2", "c").is_none());
    }

    #[test]
    fn lookup_kinds_have_acks_and_help_does_not() {
        assert!(ack_message(CommandKind::Help).is_none());
        for kind in [
            CommandKind::Delivery,
            CommandKind::Internet,
            CommandKind::Ruc,
            CommandKind::Dni,
        ] {
            assert!(ack_message(kind).is_some());
        }
    }
}
