use itertools::Itertools;

/// Leading whitespace of a line, `None` for blank lines.
pub fn get_indent(line: &str) -> Option<&str> {
    let ix = line.find(|c: char| !c.is_whitespace())?;
    Some(&line[..ix])
}

/// Longest whitespace prefix shared by every non-blank line.
pub fn common_indent(source: &str) -> &str {
    let mut common: Option<&str> = None;
    for indent in source.lines().filter_map(get_indent) {
        common = Some(match common {
            None => indent,
            Some(prev) => {
                let len = prev
                    .char_indices()
                    .zip(indent.chars())
                    .take_while(|((_, a), b)| a == b)
                    .map(|((ix, a), _)| ix + a.len_utf8())
                    .last()
                    .unwrap_or(0);
                &prev[..len]
            }
        });
    }
    common.unwrap_or("")
}

/// Whitespace normalization of a code block body: strips the common leading
/// indentation, empties whitespace-only lines and trims the outer blank lines
/// and trailing whitespace.
pub fn normalize_code_source(source: &str) -> String {
    let indent = common_indent(source);
    let lines = source
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(indent).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>();
    let start = lines.iter().position(|x| !x.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|x| !x.is_empty()).map(|x| x + 1).unwrap_or(start);
    lines[start..end]
        .iter()
        .join("\n")
        .trim_end()
        .to_owned()
}
