use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored loan applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle states a loan application moves through. Wire labels keep the
/// underscore form the sibling services exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "Application_Submitted")]
    Submitted,
    #[serde(rename = "Under_Review")]
    UnderReview,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Rejected")]
    Rejected,
    #[serde(rename = "Disbursed")]
    Disbursed,
    #[serde(rename = "Closed")]
    Closed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Application_Submitted",
            ApplicationStatus::UnderReview => "Under_Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Disbursed => "Disbursed",
            ApplicationStatus::Closed => "Closed",
        }
    }
}

/// Raised when a status string does not name a known lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized application status '{0}'")]
pub struct InvalidStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Application_Submitted" => Ok(Self::Submitted),
            "Under_Review" => Ok(Self::UnderReview),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "Disbursed" => Ok(Self::Disbursed),
            "Closed" => Ok(Self::Closed),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// Borrower snapshot copied from the user service at write time. Only the id
/// is guaranteed: a bare reference attached by a partial update carries
/// nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Borrower {
    pub fn bare(user_id: u64) -> Self {
        Self {
            user_id,
            name: None,
            email: None,
        }
    }
}

/// Loan product snapshot copied from the admin service at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub product_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<i64>,
}

impl LoanProduct {
    pub fn bare(product_id: u64) -> Self {
        Self {
            product_id,
            product_name: None,
            interest_rate: None,
            max_amount: None,
        }
    }
}

/// Vendor snapshot copied from the admin service at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

impl Vendor {
    pub fn bare(vendor_id: u64) -> Self {
        Self {
            vendor_id,
            vendor_name: None,
        }
    }
}

/// Stored loan application record. Owns copies of the referenced entities'
/// data as captured at the last validating write; no live foreign-key
/// enforcement exists, so the snapshots can go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub amount_required: i64,
    pub tenure: u32,
    pub status: ApplicationStatus,
    pub review_message: String,
    pub user: Borrower,
    pub product: LoanProduct,
    pub vendor: Vendor,
}

/// Payload for creating an application. Status is not accepted here; every
/// new application starts as `Application_Submitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoanApplication {
    pub amount_required: i64,
    pub tenure: u32,
    #[serde(default)]
    pub review_message: String,
    pub user_id: u64,
    pub product_id: u64,
    pub vendor_id: u64,
}

/// Payload for a full update. All three references are re-resolved against
/// the remote services before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplicationUpdate {
    pub amount_required: i64,
    pub tenure: u32,
    #[serde(default)]
    pub review_message: String,
    pub status: ApplicationStatus,
    pub user_id: u64,
    pub product_id: u64,
    pub vendor_id: u64,
}

/// One field-level change in a partial update. Reference patches carry a bare
/// id; the service attaches the placeholder without remote validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    AmountRequired(i64),
    Tenure(u32),
    ReviewMessage(String),
    Status(ApplicationStatus),
    User(u64),
    Product(u64),
    Vendor(u64),
}

/// A set of field patches decoded from a JSON object keyed by field name.
///
/// Unknown keys are rejected at decode time rather than silently ignored, and
/// every payload is typed, so a typo'd field or a string amount fails the
/// request instead of being dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    patches: Vec<FieldPatch>,
}

impl PatchSet {
    pub fn new(patches: Vec<FieldPatch>) -> Self {
        Self { patches }
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPatch> {
        self.patches.iter()
    }
}

const PATCH_FIELDS: &[&str] = &[
    "amount_required",
    "tenure",
    "review_message",
    "status",
    "user",
    "product",
    "vendor",
];

impl<'de> Deserialize<'de> for PatchSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object: serde_json::Map<String, serde_json::Value> =
            Deserialize::deserialize(deserializer)?;
        let mut patches = Vec::with_capacity(object.len());

        for (key, value) in object {
            let patch = match key.as_str() {
                "amount_required" => FieldPatch::AmountRequired(decode(&key, value)?),
                "tenure" => FieldPatch::Tenure(decode(&key, value)?),
                "review_message" => FieldPatch::ReviewMessage(decode(&key, value)?),
                "status" => {
                    let label: String = decode(&key, value)?;
                    let status = ApplicationStatus::from_str(&label)
                        .map_err(|err| de::Error::custom(err.to_string()))?;
                    FieldPatch::Status(status)
                }
                "user" => FieldPatch::User(decode(&key, value)?),
                "product" => FieldPatch::Product(decode(&key, value)?),
                "vendor" => FieldPatch::Vendor(decode(&key, value)?),
                other => {
                    return Err(de::Error::unknown_field(other, PATCH_FIELDS));
                }
            };
            patches.push(patch);
        }

        Ok(PatchSet { patches })
    }
}

fn decode<T, E>(field: &str, value: serde_json::Value) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(value)
        .map_err(|err| de::Error::custom(format!("invalid value for '{field}': {err}")))
}
