//! Shell-injection signatures checked against message bodies.

use regex::Regex;
use std::sync::LazyLock;

/// A named signature. Only the name is ever reported.
pub(crate) struct BlockedPattern {
    pub(crate) name: &'static str,
    pub(crate) regex: Regex,
}

impl BlockedPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("invalid blocked pattern"),
        }
    }
}

const SHELLS: &str = "sh|bash|zsh|dash|ksh|fish|csh|tcsh";
const INTERPRETERS: &str = "python[0-9.]*|perl|ruby|node|php|lua|eval|exec";

/// What may follow a binary name for it to read as a command rather than a
/// word: end of input, a flag, a path, quoted or expanded argument, or
/// another shell operator.
const INVOCATION: &str = r#"(?:\s*$|\s+-|\s+["'/~.$`]|\s*[;&|<>])"#;

/// Checked in order; each match contributes one error.
pub(crate) static BLOCKED_PATTERNS: LazyLock<Vec<BlockedPattern>> = LazyLock::new(|| {
    vec![
        BlockedPattern::new(
            "command chaining into a shell or interpreter",
            &format!(
                r"(?:;|&&|\|\|)\s*(?:sudo\s+)?(?:/[\w./-]*/)?(?:{SHELLS}|{INTERPRETERS}){INVOCATION}"
            ),
        ),
        BlockedPattern::new(
            "pipe into a shell",
            &format!(r"\|\s*(?:sudo\s+)?(?:/[\w./-]*/)?(?:{SHELLS}){INVOCATION}"),
        ),
        BlockedPattern::new(
            "backtick command substitution",
            r"`\s*(?:sh|bash|curl|wget|rm|nc|cat|whoami|id|uname|python[0-9.]*|perl|eval)\b[^`]*`",
        ),
        BlockedPattern::new("$() command substitution", r"\$\("),
        BlockedPattern::new("process substitution", r"(?:^|\s)[<>]\("),
        BlockedPattern::new(
            "heredoc redirection",
            r#"(?m)<<-?\s*['"]?[A-Z_][A-Z0-9_]*['"]?[ \t]*$"#,
        ),
        BlockedPattern::new(
            "sensitive environment variable override",
            r"(?:^|[\s;&|])(?:export\s+)?(?:LD_PRELOAD|LD_LIBRARY_PATH|DYLD_INSERT_LIBRARIES|PATH|IFS|PS4|BASH_ENV|ENV|PROMPT_COMMAND|SHELLOPTS|PYTHONPATH|NODE_OPTIONS|PERL5OPT)=",
        ),
        BlockedPattern::new(
            "redirection into a system path",
            r"(?:^|[^-=>])>{1,2}\s*/(?:dev/(?:sd|hd|nvme|mem|kmem|port|tcp|udp)|etc/|proc/|sys/|boot/)",
        ),
        BlockedPattern::new(
            "permission bypass flag",
            r"--dangerously-skip-permissions\b",
        ),
    ]
});

/// ANSI CSI sequences: `ESC [ params letter`.
pub(crate) static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("invalid ANSI pattern"));
