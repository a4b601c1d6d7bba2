//! Reading the list of URLs to download.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Parse one URL per line, preserving order.
///
/// Surrounding whitespace (including a trailing `\r`) is trimmed; blank
/// lines and lines starting with `#` are skipped.
pub fn parse_url_list<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        urls.push(url.to_string());
    }
    Ok(urls)
}

/// Read the URL list file at `path`.
pub fn read_url_list(path: &Path) -> io::Result<Vec<String>> {
    parse_url_list(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_preserves_order() {
        let input = "a.com/1\nb.com/2\nc.com/3\n";
        let urls = parse_url_list(Cursor::new(input)).unwrap();
        assert_eq!(urls, vec!["a.com/1", "b.com/2", "c.com/3"]);
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let input = "# mirrors\n\na.com/1\r\n   \n# b.com/2\nc.com/3";
        let urls = parse_url_list(Cursor::new(input)).unwrap();
        assert_eq!(urls, vec!["a.com/1", "c.com/3"]);
    }

    #[test]
    fn test_read_from_file() {
        use std::io::Write;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "example.com/large.bin").unwrap();
        writeln!(file, "example.com/small.bin").unwrap();

        let urls = read_url_list(file.path()).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1], "example.com/small.bin");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(read_url_list(Path::new("/definitely/not/here.txt")).is_err());
    }
}
