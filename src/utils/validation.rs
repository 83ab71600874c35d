use crate::utils::error::{MossError, Result};
use std::path::Path;
use url::Url;

/// Languages accepted by the MOSS server.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "c", "cc", "java", "ml", "pascal", "ada", "lisp", "scheme", "haskell", "fortran", "ascii",
    "vhdl", "verilog", "perl", "matlab", "python", "mips", "prolog", "spice", "vb", "csharp",
    "modula2", "a8086", "javascript", "plsql",
];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(MossError::invalid_argument(
            field_name,
            url_str,
            "URL cannot be empty",
        ));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(MossError::invalid_argument(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(MossError::invalid_argument(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(MossError::invalid_argument(
            field_name,
            path,
            "Path cannot be empty",
        ));
    }

    if path.contains('\0') {
        return Err(MossError::invalid_argument(
            field_name,
            path,
            "Path contains null bytes",
        ));
    }

    Ok(())
}

/// 輸出路徑必須是已存在的目錄
pub fn validate_output_dir(field_name: &str, path: &Path) -> Result<()> {
    let display = path.display().to_string();
    validate_path(field_name, &display)?;

    if !path.exists() {
        return Err(MossError::invalid_argument(
            field_name,
            display,
            "Path does not exist",
        ));
    }
    if !path.is_dir() {
        return Err(MossError::invalid_argument(
            field_name,
            display,
            "Path does not lead to a directory",
        ));
    }
    Ok(())
}

pub fn validate_existing_file(field_name: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(MossError::invalid_argument(
            field_name,
            path.display().to_string(),
            "File does not exist",
        ));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(MossError::invalid_argument(
            field_name,
            value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MossError::invalid_argument(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(MossError::invalid_argument(
            field_name,
            value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_language(field_name: &str, language: &str) -> Result<()> {
    if !SUPPORTED_LANGUAGES.contains(&language) {
        return Err(MossError::invalid_argument(
            field_name,
            language,
            format!("Unsupported language. Valid languages: {}", SUPPORTED_LANGUAGES.join(", ")),
        ));
    }
    Ok(())
}
