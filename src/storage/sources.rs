// src/storage/sources.rs
use crate::utils::error::StorageError;
use glob::{glob, Pattern};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Expands the given inputs into an ordered list of markdown files.
///
/// Files are kept in the order given. A directory contributes its `.md`
/// files in natural name order, so `set9.md` comes before `set10.md`.
pub fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, StorageError> {
    let mut sources = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let dir = Pattern::escape(&input.display().to_string());
            let mut found: Vec<PathBuf> = glob(&format!("{}/*.md", dir))?
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .collect();
            found.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
            tracing::debug!("{} markdown files in {}", found.len(), input.display());
            sources.extend(found);
        } else if input.is_file() {
            sources.push(input.clone());
        } else {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("input not found: {}", input.display()),
            )));
        }
    }

    Ok(sources)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compares names treating runs of digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let ord = left
                    .trim_start_matches('0')
                    .len()
                    .cmp(&right.trim_start_matches('0').len())
                    .then_with(|| left.trim_start_matches('0').cmp(right.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}
