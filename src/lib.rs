//! Core library for the estate-sheets listing manager.
//!
//! The library exposes high-level operations that power the user-facing
//! surface as well as the integration tests. The modules are structured to
//! keep responsibilities narrow and composable: the spreadsheet and map
//! backends live under [`estate::sheets::io`], data representations inside
//! [`estate::sheets::model`], header normalization in
//! [`estate::sheets::normalize`], signature matching in
//! [`estate::sheets::signature`] and [`estate::sheets::reconcile`], and the
//! mutation orchestration under [`estate::sheets::sync`].

pub mod estate;

pub use estate::sheets::{
    Result, SheetError, briefing, config, error, filter, io, model, normalize, reconcile,
    session, signature, sync,
};
