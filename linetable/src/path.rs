/// Normalize a source path so that the same file is not split across
/// entries that differ only by redundant path syntax.
///
/// Collapses repeated `/`, drops `.` components, and resolves `..`
/// against the preceding component when one is available. A leading
/// `/` and the relative/absolute-ness of the input are preserved, and
/// a `..` is never allowed to rise above the root of a relative path.
/// This is purely textual: no filesystem access is performed.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');

    let mut out: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ if absolute => {
                    // Can't rise above the root of an absolute path; drop it.
                }
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }

    let joined = out.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_redundant_separators_and_dots() {
        assert_eq!(normalize_path("/a//b/./c/../d"), "/a/b/d");
    }

    #[test]
    fn walks_above_a_relative_root() {
        assert_eq!(normalize_path("a/../../b"), "../b");
    }

    #[test]
    fn drops_a_leading_dot_component() {
        assert_eq!(normalize_path("./x"), "x");
    }

    #[test]
    fn root_stays_root() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn is_idempotent() {
        for p in [
            "/a//b/./c/../d",
            "a/../../b",
            "./x",
            "/",
            "relative/path/to/file.c",
            "/absolute/path/to/file.c",
            "../../../escaping",
        ] {
            let once = normalize_path(p);
            let twice = normalize_path(&once);
            assert_eq!(once, twice, "not idempotent for {p:?}");
        }
    }

    #[test]
    fn cannot_rise_above_an_absolute_root() {
        assert_eq!(normalize_path("/../../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn preserves_plain_relative_paths() {
        assert_eq!(normalize_path("src/main.c"), "src/main.c");
    }
}
