//! Form payloads and their validation.
//!
//! Validation runs before anything is sent to the API. Failures come back
//! as [`FieldErrors`], the same type the API's 400 responses decode into,
//! so templates render both the same way.

use glowhaus_api::FieldErrors;
use glowhaus_core::models::{ProfileUpdate, ShippingAddress};
use glowhaus_core::models::PaymentMethod;
use glowhaus_core::{Cart, Email};
use serde::Deserialize;

/// Shortest password the storefront accepts.
pub const MIN_PASSWORD_LEN: usize = 8;

const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 9..=15;

/// Trim a required text field; `None` when blank.
fn required(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Trim an optional text field; blank becomes `None`.
fn optional(value: Option<&str>) -> Option<String> {
    value.and_then(required)
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        errors.add(field, "Enter your email address.");
        return None;
    }
    match Email::parse(value) {
        Ok(email) => Some(email.into_inner()),
        Err(_) => {
            errors.add(field, "Enter a valid email address.");
            None
        }
    }
}

fn check_new_password(errors: &mut FieldErrors, field: &str, password: &str, confirm: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("Use at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if password != confirm {
        errors.add(&format!("{field}_confirm"), "Passwords don't match.");
    }
}

/// Normalize a phone number: spaces and dashes are dropped, then it must
/// be 9 to 15 digits with an optional leading `+`.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    let valid = PHONE_DIGITS.contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(compact)
}

// =============================================================================
// Auth
// =============================================================================

/// Login form data.
#[derive(Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    /// Returns the normalized email.
    ///
    /// # Errors
    ///
    /// Returns per-field messages when the email is malformed or the
    /// password is empty.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, "email", &self.email);
        if self.password.is_empty() {
            errors.add("password", "Enter your password.");
        }
        errors.into_result()?;
        email.ok_or_else(FieldErrors::new)
    }
}

/// Registration form data.
#[derive(Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// A registration that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns per-field messages for a bad email, missing names, an
    /// invalid phone, or a short or mismatched password.
    pub fn validate(&self) -> Result<ValidRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, "email", &self.email);
        let first_name = required(&self.first_name);
        if first_name.is_none() {
            errors.add("first_name", "Enter your first name.");
        }
        let last_name = required(&self.last_name);
        if last_name.is_none() {
            errors.add("last_name", "Enter your last name.");
        }
        let phone = match optional(self.phone.as_deref()) {
            Some(raw) => {
                let phone = normalize_phone(&raw);
                if phone.is_none() {
                    errors.add("phone", "Enter a phone number with 9 to 15 digits.");
                }
                phone
            }
            None => None,
        };
        check_new_password(&mut errors, "password", &self.password, &self.password_confirm);
        errors.into_result()?;

        match (email, first_name, last_name) {
            (Some(email), Some(first_name), Some(last_name)) => Ok(ValidRegistration {
                email,
                first_name,
                last_name,
                phone,
            }),
            _ => Err(FieldErrors::new()),
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// A checkout that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    /// Number the payment prompt is sent to.
    pub phone: String,
}

impl CheckoutForm {
    /// # Errors
    ///
    /// Returns per-field messages for missing delivery details, an invalid
    /// phone, an unknown payment method, or an empty cart.
    pub fn validate(&self, cart: &Cart) -> Result<ValidCheckout, FieldErrors> {
        let mut errors = FieldErrors::new();
        if cart.is_empty() {
            errors.push_general("Your bag is empty.");
        }

        let full_name = required(&self.full_name);
        if full_name.is_none() {
            errors.add("full_name", "Enter the recipient's name.");
        }
        let phone = if self.phone.trim().is_empty() {
            errors.add("phone", "Enter a phone number.");
            None
        } else {
            let phone = normalize_phone(&self.phone);
            if phone.is_none() {
                errors.add("phone", "Enter a phone number with 9 to 15 digits.");
            }
            phone
        };
        let address = required(&self.address);
        if address.is_none() {
            errors.add("address", "Enter a delivery address.");
        }
        let city = required(&self.city);
        if city.is_none() {
            errors.add("city", "Enter a city or town.");
        }
        let payment_method = match optional(self.payment_method.as_deref()) {
            None => PaymentMethod::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add("payment_method", "Choose a payment method.");
                PaymentMethod::default()
            }),
        };
        errors.into_result()?;

        match (full_name, phone, address, city) {
            (Some(full_name), Some(phone), Some(address), Some(city)) => Ok(ValidCheckout {
                shipping_address: ShippingAddress {
                    full_name,
                    phone: phone.clone(),
                    address,
                    city,
                    postal_code: optional(self.postal_code.as_deref()),
                },
                notes: optional(self.notes.as_deref()),
                payment_method,
                phone,
            }),
            _ => Err(FieldErrors::new()),
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// Profile form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ProfileForm {
    /// # Errors
    ///
    /// Returns per-field messages for a malformed email or phone.
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = check_email(&mut errors, "email", &self.email);
        let phone = match optional(self.phone.as_deref()) {
            Some(raw) => {
                let phone = normalize_phone(&raw);
                if phone.is_none() {
                    errors.add("phone", "Enter a phone number with 9 to 15 digits.");
                }
                phone
            }
            None => None,
        };
        errors.into_result()?;

        Ok(ProfileUpdate {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.unwrap_or_default(),
            phone,
        })
    }
}

/// Change-password form data.
#[derive(Default, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

impl PasswordForm {
    /// # Errors
    ///
    /// Returns per-field messages for a missing current password or a
    /// short or mismatched new one.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.current_password.is_empty() {
            errors.add("current_password", "Enter your current password.");
        }
        check_new_password(
            &mut errors,
            "new_password",
            &self.new_password,
            &self.new_password_confirm,
        );
        errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glowhaus_core::{CartLine, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    fn cart_with_one_item() -> Cart {
        let mut cart = Cart::default();
        cart.add(CartLine {
            product_id: ProductId::new(1),
            variant_id: None,
            slug: "rose-toner".to_string(),
            name: "Rose Toner".to_string(),
            variant_label: None,
            unit_price: Decimal::new(180_000, 2),
            quantity: 1,
            image_url: None,
        });
        cart
    }

    fn checkout() -> CheckoutForm {
        CheckoutForm {
            full_name: "Amina Otieno".to_string(),
            phone: "+254 712-345-678".to_string(),
            address: "12 Riverside Drive".to_string(),
            city: "Nairobi".to_string(),
            postal_code: Some(String::new()),
            notes: Some("  ".to_string()),
            payment_method: None,
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+254 712 345 678").as_deref(), Some("+254712345678"));
        assert_eq!(normalize_phone("0712-345-678").as_deref(), Some("0712345678"));
        assert_eq!(normalize_phone("12345678"), None); // 8 digits
        assert_eq!(normalize_phone("1234567890123456"), None); // 16 digits
        assert_eq!(normalize_phone("07123x5678"), None);
        assert_eq!(normalize_phone("++254712345678"), None);
    }

    #[test]
    fn test_login_requires_email_and_password() {
        let form = LoginForm {
            email: "not-an-email".to_string(),
            password: String::new(),
            next: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("password"));

        let form = LoginForm {
            email: " Amina@Example.COM ".to_string(),
            password: "secret".to_string(),
            next: None,
        };
        assert_eq!(form.validate().unwrap(), "Amina@example.com");
    }

    #[test]
    fn test_register_password_rules() {
        let mut form = RegisterForm {
            email: "amina@example.com".to_string(),
            first_name: "Amina".to_string(),
            last_name: "Otieno".to_string(),
            phone: None,
            password: "short".to_string(),
            password_confirm: "shorter".to_string(),
            next: None,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("password"));
        assert!(errors.has("password_confirm"));

        form.password = "long-enough".to_string();
        form.password_confirm = "long-enough".to_string();
        let valid = form.validate().unwrap();
        assert_eq!(valid.first_name, "Amina");
        assert_eq!(valid.phone, None);
    }

    #[test]
    fn test_register_requires_names() {
        let form = RegisterForm {
            email: "amina@example.com".to_string(),
            password: "long-enough".to_string(),
            password_confirm: "long-enough".to_string(),
            ..RegisterForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("first_name"));
        assert!(errors.has("last_name"));
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_checkout_valid() {
        let valid = checkout().validate(&cart_with_one_item()).unwrap();
        assert_eq!(valid.phone, "+254712345678");
        assert_eq!(valid.shipping_address.phone, "+254712345678");
        assert_eq!(valid.shipping_address.postal_code, None);
        assert_eq!(valid.notes, None);
        assert_eq!(valid.payment_method, PaymentMethod::Mpesa);
    }

    #[test]
    fn test_checkout_rejects_empty_cart() {
        let errors = checkout().validate(&Cart::default()).unwrap_err();
        assert_eq!(errors.general().len(), 1);
    }

    #[test]
    fn test_checkout_field_errors() {
        let form = CheckoutForm {
            phone: "12".to_string(),
            payment_method: Some("bitcoin".to_string()),
            ..CheckoutForm::default()
        };
        let errors = form.validate(&cart_with_one_item()).unwrap_err();
        for field in ["full_name", "phone", "address", "city", "payment_method"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_profile_email_format() {
        let form = ProfileForm {
            first_name: " Amina ".to_string(),
            last_name: "Otieno".to_string(),
            email: "amina@".to_string(),
            phone: None,
        };
        assert!(form.validate().unwrap_err().has("email"));

        let form = ProfileForm {
            email: "amina@example.com".to_string(),
            ..form
        };
        let update = form.validate().unwrap();
        assert_eq!(update.first_name, "Amina");
        assert_eq!(update.email, "amina@example.com");
    }

    #[test]
    fn test_password_change_rules() {
        let form = PasswordForm {
            current_password: String::new(),
            new_password: "long-enough".to_string(),
            new_password_confirm: "long-enough".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("current_password"));
        assert!(!errors.has("new_password"));
    }
}
