//! Bazaar - rules engine for a trading and bluffing card game
//!
//! This crate provides the core game logic for Bazaar, including:
//! - The 120-card catalog and deck factory
//! - Complete-set identification for trade-ins
//! - The ten-phase round cycle and per-phase action whitelist
//! - Turn rotation and eligibility rules
//! - Interactive action-card and Gotcha effects
//! - A pure transition function with automatic phase cascading
//!
//! # Architecture
//!
//! The engine is synchronous and does no I/O. [`transition`] takes a state
//! and an action and returns a new state, leaving its input untouched, so a
//! server can keep previous states around and broadcast snapshots freely.
//! Randomness comes from a seed stored in the state, which makes every game
//! reproducible from its START_GAME seed.
//!
//! # Modules
//!
//! - [`card`]: Card kinds, catalog data and deck building
//! - [`sets`]: Complete-set detection
//! - [`phase`]: Phase cycle and action whitelist
//! - [`turn`]: Rotation order and player eligibility
//! - [`game`]: Game state and the transition function
//! - [`effects`]: Action-card effects
//! - [`tradein`]: Gotcha and Thing trade-ins
//! - [`moves`]: Valid action enumeration

pub mod actions;
pub mod card;
pub mod effects;
pub mod error;
pub mod game;
pub mod moves;
pub mod phase;
pub mod player;
pub mod sets;
pub mod tradein;
pub mod turn;

// Re-export commonly used types
pub use actions::{ActionType, GameAction, GotchaChoice};
pub use card::{
    build_deck, make_card, shuffle, ActionCardKind, Card, CardKind, CardType, GotchaKind,
    ThingKind,
};
pub use effects::{AddOneStage, EffectState, GotchaEffect, GotchaEffectKind, GotchaStage};
pub use error::{ErrorKind, GameError};
pub use game::{
    create_initial_state, transition, DistributionSummary, GameState, OfferTransfer, HAND_SIZE,
    MAX_NAME_LENGTH, MAX_PLAYERS, MIN_PLAYERS, OFFER_SIZE, POINTS_TO_WIN,
};
pub use phase::{get_phase_order, is_action_allowed, next_phase, GamePhase};
pub use player::{OfferCard, Player, PlayerId};
pub use sets::{find_complete_sets, find_complete_sets_by_priority_order};
