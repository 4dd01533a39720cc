use crate::formats::FormatValidation;
use std::path::Path;

/// File-level checks shared by the ROI readers
pub struct FormatValidator;

impl FormatValidator {
    /// Validate that a file exists and is readable
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        if !path.exists() {
            validation.errors.push(format!("File not found: {}", path.display()));
            return validation;
        }
        if let Err(e) = std::fs::metadata(path) {
            validation.errors.push(format!("Cannot access file: {}", e));
        }

        validation
    }

    /// Validate that required component files exist for multi-file formats
    pub fn validate_component_files(
        base_path: &Path,
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        for ext in required_extensions {
            let component_path = base_path.with_extension(ext);
            if !component_path.exists() {
                validation
                    .errors
                    .push(format!("Missing required file: {}", component_path.display()));
            }
        }

        for ext in optional_extensions {
            let component_path = base_path.with_extension(ext);
            if !component_path.exists() {
                validation.warnings.push(format!(
                    "Optional file not found: {} (CRS defaults to EPSG:4326)",
                    component_path.display()
                ));
            }
        }

        validation
    }

    /// Merge multiple validation results into one
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        validations.into_iter().fold(FormatValidation::default(), |mut merged, v| {
            merged.errors.extend(v.errors);
            merged.warnings.extend(v.warnings);
            merged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let validation = FormatValidator::validate_file_exists(Path::new("/nonexistent/roi.shp"));
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_component_files() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("roi");
        std::fs::write(base.with_extension("shp"), b"").unwrap();
        std::fs::write(base.with_extension("shx"), b"").unwrap();

        let validation =
            FormatValidator::validate_component_files(&base, &["shp", "shx", "dbf"], &["prj"]);
        assert_eq!(validation.errors.len(), 1);
        assert!(validation.errors[0].contains("roi.dbf"));
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_merge() {
        let a = FormatValidation { errors: vec!["e1".into()], warnings: vec![] };
        let b = FormatValidation { errors: vec![], warnings: vec!["w1".into()] };
        let merged = FormatValidator::merge_validations(vec![a, b]);
        assert_eq!(merged.errors, vec!["e1"]);
        assert_eq!(merged.warnings, vec!["w1"]);
    }
}
