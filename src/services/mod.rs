//! Database operations. Every function works on a borrowed connection so
//! callers decide the transaction boundary.

pub mod availability;
pub mod calendar;
pub mod checkin;
pub mod folio;
pub mod inventory;
pub mod invoice;
pub mod massive_changes;
pub mod payment;
pub mod pricing;
pub mod property;
pub mod reservation;
pub mod service;
