/// Returns the new-file line numbers of every added (`+`) line in a unified
/// diff hunk, as served in the `patch` field of the compare API.
pub fn added_line_numbers(patch: &str) -> Vec<u64> {
    if patch.trim().is_empty() {
        return Vec::new();
    }

    let mut current_line = 0_u64;
    let mut added = Vec::new();
    for line in patch.split('\n') {
        if line.trim().is_empty() {
            current_line += 1;
            continue;
        }
        if let Some(start) = parse_hunk_start(line) {
            current_line = start;
            continue;
        }
        if line.starts_with("diff ")
            || line.starts_with("index ")
            || line.starts_with("--- ")
            || line.starts_with("+++ ")
        {
            continue;
        }
        if line.starts_with('+') {
            added.push(current_line);
            current_line += 1;
        } else if !line.starts_with('-') {
            current_line += 1;
        }
    }
    added
}

/// First added line, used to anchor an inline review comment.
pub fn first_added_line(patch: &str) -> Option<u64> {
    added_line_numbers(patch).into_iter().next()
}

/// Parses `@@ -a[,b] +c[,d] @@` and returns `c`.
fn parse_hunk_start(line: &str) -> Option<u64> {
    let rest = line.strip_prefix("@@ -")?;
    let (old_range, rest) = rest.split_once(' ')?;
    if !is_range(old_range) {
        return None;
    }
    let rest = rest.strip_prefix('+')?;
    let (new_range, rest) = rest.split_once(' ')?;
    if !is_range(new_range) || !rest.starts_with("@@") {
        return None;
    }
    let start = new_range.split(',').next()?;
    start.parse().ok()
}

fn is_range(raw: &str) -> bool {
    let mut parts = raw.splitn(2, ',');
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
    match (parts.next(), parts.next()) {
        (Some(start), None) => digits(start),
        (Some(start), Some(count)) => digits(start) && digits(count),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{added_line_numbers, first_added_line};

    #[test]
    fn unit_added_line_numbers_tracks_hunk_start_and_context() {
        let patch = "@@ -1,3 +1,4 @@\n line one\n+added two\n line three\n-removed\n+added four";
        assert_eq!(added_line_numbers(patch), vec![2, 4]);
    }

    #[test]
    fn functional_added_line_numbers_handles_multiple_hunks_and_metadata() {
        let patch = "diff --git a/x b/x\nindex 1..2 100644\n--- a/x\n+++ b/x\n@@ -10 +10,2 @@\n context\n+first\n@@ -40,2 +41,3 @@ fn main() {\n+second\n keep";
        assert_eq!(added_line_numbers(patch), vec![11, 41]);
        assert_eq!(first_added_line(patch), Some(11));
    }

    #[test]
    fn regression_added_line_numbers_counts_blank_lines_and_empty_patches() {
        assert!(added_line_numbers("").is_empty());
        assert!(added_line_numbers("  \n ").is_empty());
        assert_eq!(added_line_numbers("@@ -1,2 +5,3 @@\n\n+after blank"), vec![6]);
        assert_eq!(first_added_line("@@ -1 +1 @@\n-only removed"), None);
    }
}
