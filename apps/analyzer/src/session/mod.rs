// Client-side analysis session: local storage, the session store built on it,
// and the controller that drives a submission through its lifecycle.

pub mod controller;
pub mod storage;
pub mod store;
