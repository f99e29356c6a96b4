//! Computes the text a terminal screen gained relative to an earlier
//! snapshot. Terminals redraw rather than append, so the baseline can appear
//! as a prefix, resurface mid-screen after a scroll, or vanish entirely after
//! a clear; each case needs a different cut.

/// Returns the portion of `latest` that is new relative to `baseline`.
///
/// An empty baseline means everything is new. When the baseline resurfaces
/// inside `latest` (redraw/scroll), the cut is made after its *last*
/// occurrence; an earlier occurrence would also swallow output the game
/// printed in between. A baseline that is nowhere to be found means the
/// screen was cleared, so the whole of `latest` is returned.
pub fn new_text<'a>(baseline: &str, latest: &'a str) -> &'a str {
    if baseline.is_empty() {
        return latest;
    }
    if let Some(rest) = latest.strip_prefix(baseline) {
        return rest.trim_start_matches('\n');
    }
    if let Some(idx) = latest.rfind(baseline) {
        return latest[idx + baseline.len()..].trim_start_matches('\n');
    }
    latest
}
