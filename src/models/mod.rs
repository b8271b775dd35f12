pub mod availability;
pub mod board_service;
pub mod calendar;
pub mod cancelation_rule;
pub mod checkin_partner;
pub mod folio;
pub mod invoice;
pub mod payment;
pub mod pricelist;
pub mod property;
pub mod reservation;
pub mod room;
pub mod sale_channel;
pub mod service;
pub mod wizard;
