//! Group Order Sync
//!
//! Optional overlay on the cart: participants sharing a group id mirror
//! their additions to each other over `/ws/group/{group_id}`. Remote
//! additions go through the same [`CartStore::add_line`](crate::cart::CartStore::add_line)
//! as local ones, so identical lines from the same participant merge.
//!
//! Delivery is best-effort and at-most-once. A participant who joins late
//! does not receive earlier additions.

mod session;
mod sync;

pub use session::{
    DEFAULT_PARTICIPANT_NAME, GROUP_QUERY_PARAM, GroupPhase, GroupSession, normalize_name,
};
pub use sync::{GroupCodec, GroupError, GroupSync};
