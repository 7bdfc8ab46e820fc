//! Ticket issuance and caching operations

mod get_ticket_test;
