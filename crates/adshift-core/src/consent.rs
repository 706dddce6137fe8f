// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consent model and the mapper from untyped call arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const IS_USER_SUBJECT_TO_GDPR: &str = "isUserSubjectToGDPR";
pub const HAS_CONSENT_FOR_DATA_USAGE: &str = "hasConsentForDataUsage";
pub const HAS_CONSENT_FOR_ADS_PERSONALIZATION: &str = "hasConsentForAdsPersonalization";
pub const HAS_CONSENT_FOR_AD_STORAGE: &str = "hasConsentForAdStorage";

/// User consent as understood by both native SDKs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Consent {
    /// The user falls under GDPR and has answered the three consent questions.
    GdprSubject {
        data_usage: bool,
        personalization: bool,
        ad_storage: bool,
    },
    /// The user is not subject to GDPR; no consent flags apply.
    NonGdprSubject,
}

impl Consent {
    /// Build a consent value from call arguments.
    ///
    /// Absent or non-boolean flags read as `false`. For a non-GDPR subject the
    /// three consent flags are ignored entirely.
    pub fn from_args(args: &Map<String, Value>) -> Self {
        let flag = |name: &str| args.get(name).and_then(Value::as_bool).unwrap_or(false);

        if flag(IS_USER_SUBJECT_TO_GDPR) {
            Self::GdprSubject {
                data_usage: flag(HAS_CONSENT_FOR_DATA_USAGE),
                personalization: flag(HAS_CONSENT_FOR_ADS_PERSONALIZATION),
                ad_storage: flag(HAS_CONSENT_FOR_AD_STORAGE),
            }
        } else {
            Self::NonGdprSubject
        }
    }

    pub fn is_gdpr_subject(&self) -> bool {
        matches!(self, Self::GdprSubject { .. })
    }
}
