// apps/storefront_api/src/services/notifications.rs

//! Fire-and-forget customer notifications.
//!
//! Requests hand a `Notification` to a bounded queue and move on. A single
//! background worker drains the queue and logs what the mock mailer sends.
//! A full or closed queue drops the notification with a warning; it never
//! fails or blocks the request that raised it.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
  /// Broadcast to every customer.
  NotifyCustomers { message: String },
  OrderPlaced { order_id: i64, customer_id: i64 },
}

impl Notification {
  fn subject(&self) -> String {
    match self {
      Notification::NotifyCustomers { message } => format!("News: {}", message),
      Notification::OrderPlaced { order_id, .. } => format!("Order #{} received", order_id),
    }
  }

  fn recipient(&self) -> String {
    match self {
      Notification::NotifyCustomers { .. } => "customers@storefront.local".to_string(),
      Notification::OrderPlaced { customer_id, .. } => format!("customer-{}@storefront.local", customer_id),
    }
  }

  fn body(&self) -> String {
    match self {
      Notification::NotifyCustomers { message } => format!("<p>{}</p>", message),
      Notification::OrderPlaced { order_id, .. } => {
        format!("<p>Thanks for your order. Order #{} is pending payment.</p>", order_id)
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct Notifier {
  tx: mpsc::Sender<Notification>,
}

impl Notifier {
  /// A notifier whose queue is drained by the caller. Used by `start` and by tests.
  pub fn with_receiver(capacity: usize) -> (Notifier, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Notifier { tx }, rx)
  }

  /// Spawns the delivery worker on the current tokio runtime.
  pub fn start(capacity: usize, sender: String) -> (Notifier, JoinHandle<()>) {
    let (notifier, rx) = Notifier::with_receiver(capacity);
    let worker = tokio::spawn(run_worker(rx, sender));
    info!(capacity, "Notification worker started.");
    (notifier, worker)
  }

  /// Queues `notification` without waiting. Returns whether it was accepted.
  pub fn dispatch(&self, notification: Notification) -> bool {
    match self.tx.try_send(notification) {
      Ok(()) => true,
      Err(TrySendError::Full(dropped)) => {
        warn!(notification = ?dropped, "Notification queue full; dropping notification.");
        false
      }
      Err(TrySendError::Closed(dropped)) => {
        warn!(notification = ?dropped, "Notification worker is gone; dropping notification.");
        false
      }
    }
  }
}

async fn run_worker(mut rx: mpsc::Receiver<Notification>, sender: String) {
  while let Some(notification) = rx.recv().await {
    let delivery = deliver(&sender, &notification);
    info!(
      to = %delivery.to,
      subject = %delivery.subject,
      preview = %delivery.body_preview,
      message_id = %delivery.message_id,
      "Mock notification sent."
    );
  }
  info!("Notification queue closed; worker exiting.");
}

/// What the mock mailer would have sent.
#[derive(Debug)]
pub struct Delivery {
  pub to: String,
  pub subject: String,
  pub body_preview: String,
  pub message_id: String,
}

#[instrument(name = "notifications::deliver", level = "debug", skip(sender, notification))]
fn deliver(sender: &str, notification: &Notification) -> Delivery {
  let subject = notification.subject();
  debug!(from = %sender, subject = %subject, "Rendering notification email.");
  Delivery {
    to: notification.recipient(),
    subject,
    body_preview: notification.body().chars().take(50).collect::<String>() + "...",
    message_id: format!("mock_email_{}", uuid::Uuid::new_v4()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn full_queue_drops_without_blocking() {
    let (notifier, mut rx) = Notifier::with_receiver(1);
    assert!(notifier.dispatch(Notification::NotifyCustomers {
      message: "hello".to_string()
    }));
    assert!(!notifier.dispatch(Notification::OrderPlaced {
      order_id: 1,
      customer_id: 2
    }));
    assert_eq!(
      rx.recv().await,
      Some(Notification::NotifyCustomers {
        message: "hello".to_string()
      })
    );
  }

  #[tokio::test]
  async fn closed_queue_is_not_an_error() {
    let (notifier, rx) = Notifier::with_receiver(4);
    drop(rx);
    assert!(!notifier.dispatch(Notification::NotifyCustomers {
      message: "anyone?".to_string()
    }));
  }

  #[test]
  fn delivery_is_addressed_from_the_notification() {
    let delivery = deliver(
      "noreply@storefront.local",
      &Notification::OrderPlaced {
        order_id: 42,
        customer_id: 7,
      },
    );
    assert_eq!(delivery.to, "customer-7@storefront.local");
    assert_eq!(delivery.subject, "Order #42 received");
    assert!(delivery.message_id.starts_with("mock_email_"));
    assert!(delivery.body_preview.ends_with("..."));
  }

  #[tokio::test]
  async fn worker_drains_the_queue_and_exits_when_closed() {
    let (notifier, rx) = Notifier::with_receiver(4);
    let worker = tokio::spawn(run_worker(rx, "noreply@storefront.local".to_string()));
    assert!(notifier.dispatch(Notification::NotifyCustomers {
      message: "hello".to_string()
    }));
    assert!(notifier.dispatch(Notification::OrderPlaced {
      order_id: 3,
      customer_id: 9
    }));
    drop(notifier);
    tokio::time::timeout(std::time::Duration::from_secs(5), worker)
      .await
      .expect("worker exits once every sender is dropped")
      .unwrap();
  }
}
