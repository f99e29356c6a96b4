use std::sync::LazyLock;

use regex_lite::Regex;

static ESCAPE_SEQUENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"\x1b\[[0-9;?]*[A-Za-z]|\x1b\][^\x07]*\x07"));

/// Strips CSI and OSC escape sequences and drops lines that are blank after
/// stripping. All terminal output is run through here before it is compared
/// or shown anywhere.
pub fn clean_screen_text(raw: &str) -> String {
    let stripped = ESCAPE_SEQUENCE_REGEX.replace_all(raw, "");
    stripped
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Panic is ok thanks to the `load_regex` test.
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}
