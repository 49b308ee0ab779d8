//! Shared fixtures: an in-memory database, seed rows, and test doubles
//! for the payment processor and email provider.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sprout_common::{Error, Result};
use sprout_payments::{CheckoutProvider, CheckoutRequest, CheckoutSession};
use sprout_portal::models::{new_id, Account, ClassOffering, Role, Student};
use sprout_portal::notify::{Email, EmailSender};
use sprout_portal::session::Actor;
use sprout_portal::storage::Storage;
use sqlx::types::Json;

/// Records every email instead of delivering it.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<Email>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().iter().map(|e| e.subject.clone()).collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: &Email) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Hands out checkout sessions without talking to anything, counting calls.
#[derive(Default)]
pub struct StubCheckout {
    calls: AtomicUsize,
}

impl StubCheckout {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckoutProvider for StubCheckout {
    async fn create_session(&self, _request: &CheckoutRequest) -> Result<CheckoutSession> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CheckoutSession {
            id: format!("cs_test_{n}"),
            url: format!("https://checkout.test/c/cs_test_{n}"),
        })
    }
}

/// Always refuses to create a session.
pub struct FailingCheckout;

#[async_trait]
impl CheckoutProvider for FailingCheckout {
    async fn create_session(&self, _request: &CheckoutRequest) -> Result<CheckoutSession> {
        Err(Error::Payment("connection refused".to_string()))
    }
}

pub async fn storage() -> Storage {
    Storage::in_memory().await.unwrap()
}

pub async fn seed_class(storage: &Storage, max_spots: i64) -> ClassOffering {
    let now = Utc::now();
    let class = ClassOffering {
        id: new_id(),
        name: "Intro to Python".to_string(),
        description: Some("First steps in Python".to_string()),
        grade_levels: Json(vec!["3rd".to_string(), "4th".to_string(), "5th".to_string()]),
        start_date: NaiveDate::from_ymd_opt(2030, 9, 1).unwrap(),
        end_date: None,
        start_time: "16:00".to_string(),
        end_time: "17:00".to_string(),
        price_cents: 12000,
        charter_price_cents: Some(10000),
        one_on_one_price_cents: Some(20000),
        max_spots,
        spots_taken: 0,
        is_online: true,
        meeting_link: Some("https://meet.test/python".to_string()),
        location: None,
        allows_one_on_one: true,
        is_published: true,
        created_at: now,
        updated_at: now,
    };
    storage.insert_class(&class).await.unwrap();
    class
}

pub async fn seed_parent(storage: &Storage, email: &str) -> Account {
    let account = Account {
        id: new_id(),
        email: email.to_string(),
        password_hash: "irrelevant".to_string(),
        full_name: Some("Dana Example".to_string()),
        phone: None,
        role: Role::Parent,
        created_at: Utc::now(),
    };
    storage.insert_account(&account).await.unwrap();
    account
}

pub async fn seed_student(storage: &Storage, parent_id: &str, name: &str) -> Student {
    let student = Student {
        id: new_id(),
        parent_id: parent_id.to_string(),
        full_name: name.to_string(),
        grade_level: "4th".to_string(),
        date_of_birth: None,
        notes: None,
        created_at: Utc::now(),
    };
    storage.insert_student(&student).await.unwrap();
    student
}

pub fn actor_for(account: &Account) -> Actor {
    Actor {
        account_id: account.id.clone(),
        role: account.role,
    }
}

pub fn arc_email() -> Arc<RecordingEmailSender> {
    Arc::new(RecordingEmailSender::default())
}
