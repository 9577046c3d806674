use bcrypt::{hash, verify, DEFAULT_COST};
use kairos_common::AppError;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
        verify(password, hashed)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
    }
}
