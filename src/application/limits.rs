//! 请求校验

use std::path::Path;

use super::error::ApplicationError;
use crate::domain::TrimRange;

/// 请求限制
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    /// 单次请求允许的最大点数
    pub max_target_count: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_target_count: 16_384,
        }
    }
}

impl RequestLimits {
    pub fn check_path(&self, path: &Path) -> Result<(), ApplicationError> {
        if path.as_os_str().is_empty() {
            return Err(ApplicationError::validation("Path cannot be empty"));
        }
        Ok(())
    }

    pub fn check_count(&self, count: usize) -> Result<(), ApplicationError> {
        if count > self.max_target_count {
            return Err(ApplicationError::validation(format!(
                "Target count {} exceeds limit {}",
                count, self.max_target_count
            )));
        }
        Ok(())
    }

    /// 时长可以为 0（会回退到完整提取），但区间必须是有限、非负、有序的
    pub fn check_trim(&self, range: &TrimRange) -> Result<(), ApplicationError> {
        let values = [range.original_duration, range.start, range.end];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ApplicationError::validation(
                "Trim values must be finite and non-negative",
            ));
        }
        if range.start > range.end {
            return Err(ApplicationError::validation(format!(
                "Trim start {} is after trim end {}",
                range.start, range.end
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_limit() {
        let limits = RequestLimits { max_target_count: 100 };
        assert!(limits.check_count(100).is_ok());
        assert!(limits.check_count(101).is_err());
    }

    #[test]
    fn test_empty_path_rejected() {
        let limits = RequestLimits::default();
        assert!(limits.check_path(Path::new("")).is_err());
        assert!(limits.check_path(Path::new("/a.wav")).is_ok());
    }

    #[test]
    fn test_trim_validation() {
        let limits = RequestLimits::default();
        assert!(limits.check_trim(&TrimRange::new(10.0, 1.0, 2.0)).is_ok());
        assert!(limits.check_trim(&TrimRange::new(0.0, 0.0, 0.0)).is_ok());
        assert!(limits.check_trim(&TrimRange::new(10.0, 3.0, 2.0)).is_err());
        assert!(limits.check_trim(&TrimRange::new(10.0, -1.0, 2.0)).is_err());
        assert!(limits.check_trim(&TrimRange::new(f64::INFINITY, 1.0, 2.0)).is_err());
    }
}
