// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-app event kinds and the resolver from external event-name tokens.
//
// The token table is written once and expands into both directions of the
// mapping, so `resolve` and `token` cannot drift apart.

use serde::{Deserialize, Serialize};

macro_rules! event_kinds {
    ($($variant:ident => $token:literal),+ $(,)?) => {
        /// Category of a tracked in-app event.
        ///
        /// Every string resolves to some kind: names outside the fixed table
        /// become [`EventKind::Custom`] carrying the original token.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum EventKind {
            $($variant,)+
            Custom(String),
        }

        impl EventKind {
            /// External tokens of the fixed kinds, in table order.
            pub const FIXED_TOKENS: &'static [&'static str] = &[$($token),+];

            /// Exact, case-sensitive lookup. Never fails.
            pub fn resolve(token: &str) -> Self {
                match token {
                    $($token => Self::$variant,)+
                    other => Self::Custom(other.to_owned()),
                }
            }

            /// The external token this kind is tracked under.
            pub fn token(&self) -> &str {
                match self {
                    $(Self::$variant => $token,)+
                    Self::Custom(name) => name,
                }
            }
        }
    };
}

event_kinds! {
    Purchase => "as_purchase",
    Login => "as_login",
    AddToCart => "as_add_to_cart",
    AddToWishList => "as_add_to_wishlist",
    AddPaymentInfo => "as_add_payment_info",
    InitiatedCheckout => "as_initiated_checkout",
    CompleteRegistration => "as_complete_registration",
    TutorialCompletion => "as_tutorial_completion",
    LevelAchieved => "as_level_achieved",
    AchievementUnlocked => "as_achievement_unlocked",
    ContentView => "as_content_view",
    ListView => "as_list_view",
    Search => "as_search",
    Rate => "as_rate",
    Share => "as_share",
    Invite => "as_invite",
    ReEngage => "as_re_engage",
    Update => "as_update",
    OpenedFromPushNotification => "as_opened_from_push_notification",
    Subscribe => "as_subscribe",
    StartTrial => "as_start_trial",
    AdClick => "as_ad_click",
    AdView => "as_ad_view",
    SpentCredits => "as_spent_credits",
    TravelBooking => "as_travel_booking",
    LocationChanged => "as_location_changed",
    LocationCoordinates => "as_location_coordinates",
    OrderId => "as_order_id",
    CustomerSegment => "as_customer_segment",
}

impl EventKind {
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}
