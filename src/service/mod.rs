pub mod booking_flow;
