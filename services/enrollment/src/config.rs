use kairos_common::{
    AppError, DatabaseConfig, GatewayConfig, JwtConfig, Modality, ServerConfig, SmtpConfig,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub smtp: SmtpConfig,
    pub tuition: TuitionConfig,
}

/// Pricing knobs for the enrollment flow. Admission prices are per
/// modality; the recurring monthly fee lives on each program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuitionConfig {
    pub kids_price: Decimal,
    pub teens_price: Decimal,
    pub big_price: Decimal,
    pub sibling_discount_percentage: Decimal,
    pub sibling_threshold: usize,
    pub lookback_months: u32,
}

impl TuitionConfig {
    pub fn base_price(&self, modality: Modality) -> Decimal {
        match modality {
            Modality::Kids => self.kids_price,
            Modality::Teens => self.teens_price,
            Modality::Big => self.big_price,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        for (label, price) in [
            ("MODALITY_PRICE_KIDS", self.kids_price),
            ("MODALITY_PRICE_TEENS", self.teens_price),
            ("MODALITY_PRICE_BIG", self.big_price),
        ] {
            if price <= Decimal::ZERO {
                return Err(AppError::Internal(format!(
                    "{} must be a positive amount, got {}",
                    label, price
                )));
            }
        }

        if self.sibling_discount_percentage < Decimal::ZERO
            || self.sibling_discount_percentage > Decimal::from(100)
        {
            return Err(AppError::Internal(format!(
                "SIBLING_DISCOUNT_PERCENTAGE must be within 0..=100, got {}",
                self.sibling_discount_percentage
            )));
        }

        if self.sibling_threshold < 2 {
            return Err(AppError::Internal(
                "SIBLING_THRESHOLD must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

impl EnrollmentConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            server: ServerConfig::from_env("ENROLLMENT_HOST", "ENROLLMENT_PORT", 8001),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            smtp: SmtpConfig::from_env(),
            tuition: TuitionConfig {
                kids_price: parse_decimal("MODALITY_PRICE_KIDS", "200000"),
                teens_price: parse_decimal("MODALITY_PRICE_TEENS", "250000"),
                big_price: parse_decimal("MODALITY_PRICE_BIG", "350000"),
                sibling_discount_percentage: parse_decimal("SIBLING_DISCOUNT_PERCENTAGE", "0"),
                sibling_threshold: std::env::var("SIBLING_THRESHOLD")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                lookback_months: std::env::var("PAYMENT_LOOKBACK_MONTHS")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .unwrap_or(4),
            },
        };

        config.tuition.validate()?;
        Ok(config)
    }
}

fn parse_decimal(var: &str, default: &str) -> Decimal {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| default.parse().expect("default decimal is well-formed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuition(discount: &str, threshold: usize) -> TuitionConfig {
        TuitionConfig {
            kids_price: Decimal::from(200_000),
            teens_price: Decimal::from(250_000),
            big_price: Decimal::from(350_000),
            sibling_discount_percentage: discount.parse().unwrap(),
            sibling_threshold: threshold,
            lookback_months: 4,
        }
    }

    #[test]
    fn base_price_is_exhaustive_over_modalities() {
        let config = tuition("0", 2);
        assert_eq!(config.base_price(Modality::Kids), Decimal::from(200_000));
        assert_eq!(config.base_price(Modality::Teens), Decimal::from(250_000));
        assert_eq!(config.base_price(Modality::Big), Decimal::from(350_000));
    }

    #[test]
    fn rejects_out_of_range_discount() {
        assert!(tuition("101", 2).validate().is_err());
        assert!(tuition("10", 2).validate().is_ok());
    }

    #[test]
    fn rejects_threshold_below_two() {
        assert!(tuition("10", 1).validate().is_err());
    }
}
