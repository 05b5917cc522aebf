//! Admin catalog tools
//!
//! CRUD itself lives on [`HttpClient`](crate::HttpClient) (`api::catalog`).
//! This module adds what sits on top of it: moving entities up and down
//! the display order, and validated image uploads.

mod images;
mod reorder;

pub use images::{MAX_IMAGE_SIZE, image_content_type, upload_image_bytes, upload_image_file};
pub use reorder::{
    CatalogApi, CatalogKind, MoveDirection, OrderUpdate, Ordered, ReorderOutcome, Reorderer,
    SwapPlan, plan_swap,
};
