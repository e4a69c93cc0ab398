mod notifier;

pub use notifier::{Notifier, Subscription};
