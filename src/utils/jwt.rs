use crate::error::{AppError, AppResult};
use crate::models::{Principal, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // principal id (admin / user)
    #[serde(default)]
    pub company_id: Option<i32>,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access"
}

impl Claims {
    /// 转为强类型的调用方身份
    pub fn into_principal(self) -> AppResult<Principal> {
        let id = self
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;
        Ok(Principal::new(id, self.company_id, self.role))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    pub fn generate_access_token(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = Claims {
            sub: principal.id.to_string(),
            company_id: principal.company_id,
            role: principal.role(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip_keeps_principal() {
        let jwt = JwtService::new("test-secret", 3600);
        let admin = Principal::new(5, Some(2), Role::Admin);
        let token = jwt.generate_access_token(&admin).unwrap();

        let principal = jwt
            .verify_access_token(&token)
            .unwrap()
            .into_principal()
            .unwrap();
        assert_eq!(principal, admin);
        assert!(principal.is_admin);
        assert!(!principal.is_super_admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);
        let token = issuer
            .generate_access_token(&Principal::new(1, None, Role::SuperAdmin))
            .unwrap();
        assert!(verifier.verify_access_token(&token).is_err());
    }
}
