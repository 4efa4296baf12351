//! Shared fixtures for the integration tests
//!
//! Capabilities are mocked with `mockall`; `OrderService` is the type under test.

use automocker::{capability, Constructible, Constructor};
use mockall::mock;
use std::sync::Arc;

pub trait Repository: Send + Sync {
    fn find(&self, id: u32) -> Option<String>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> bool;
}

mock! {
    pub Repository {}

    impl Repository for Repository {
        fn find(&self, id: u32) -> Option<String>;
    }
}

mock! {
    pub Notifier {}

    impl Notifier for Notifier {
        fn notify(&self, message: &str) -> bool;
    }
}

capability!(dyn Repository => MockRepository, dyn Notifier => MockNotifier);

pub struct OrderService {
    pub repository: Arc<dyn Repository>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub retries: u32,
    pub built_by: &'static str,
}

impl OrderService {
    pub fn ship(&self, id: u32) -> bool {
        let Some(item) = self.repository.find(id) else {
            return false;
        };
        match &self.notifier {
            Some(notifier) => notifier.notify(&format!("shipped {}", item)),
            None => true,
        }
    }
}

impl Constructible for OrderService {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![
            Constructor::new("offline")
                .capability::<dyn Repository>("repository")
                .invoke(|args| {
                    Ok(OrderService {
                        repository: args.object(0)?,
                        notifier: None,
                        retries: 0,
                        built_by: "offline",
                    })
                }),
            Constructor::new("new")
                .capability::<dyn Repository>("repository")
                .capability::<dyn Notifier>("notifier")
                .invoke(|args| {
                    Ok(OrderService {
                        repository: args.object(0)?,
                        notifier: Some(args.object(1)?),
                        retries: 3,
                        built_by: "new",
                    })
                }),
            Constructor::new("with_retries")
                .capability::<dyn Repository>("repository")
                .capability::<dyn Notifier>("notifier")
                .value::<u32>("retries")
                .invoke(|args| {
                    Ok(OrderService {
                        repository: args.object(0)?,
                        notifier: Some(args.object(1)?),
                        retries: args.value(2)?,
                        built_by: "with_retries",
                    })
                }),
        ]
    }
}
