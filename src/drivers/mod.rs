//! Board-facing peripheral drivers, each in its own sub-module, kept thin
//! and separate from the flight-control logic (spec.md §1 declares the
//! display driver an external collaborator the core only sees through
//! `hal_iface::CharDisplay`).

pub mod oled;
