//! Container lifecycle scenario tests

use ovs_runtime::{
    CapabilityKey, Container, Error, LifecycleState, Result, Service, ServiceContext,
    ServiceDescriptor,
};
use std::sync::{Arc, Mutex};

/// Service that records its lifecycle transitions into a shared log
#[derive(Debug)]
struct TrackedService {
    name: &'static str,
    events: &'static Mutex<Vec<String>>,
    fail_enable: bool,
}

#[async_trait::async_trait]
impl Service for TrackedService {
    fn name(&self) -> &str {
        self.name
    }

    async fn enable(&self, _ctx: &ServiceContext) -> Result<()> {
        if self.fail_enable {
            return Err(Error::internal("enable failure injected"));
        }
        self.events.lock().unwrap().push(format!("enable {}", self.name));
        Ok(())
    }

    async fn disable(&self) -> Result<()> {
        self.events.lock().unwrap().push(format!("disable {}", self.name));
        Ok(())
    }
}

fn tracked(
    name: &'static str,
    events: &'static Mutex<Vec<String>>,
    fail_enable: bool,
) -> Arc<dyn Service> {
    events.lock().unwrap().push(format!("construct {name}"));
    Arc::new(TrackedService {
        name,
        events,
        fail_enable,
    })
}

fn container() -> Container {
    Container::new("./data", "./config")
}

mod startup_order {
    use super::*;

    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn storage(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("storage", &EVENTS, false))
    }
    fn bank(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("bank", &EVENTS, false))
    }
    fn shop(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("shop", &EVENTS, false))
    }

    #[tokio::test]
    async fn test_enable_follows_dependencies_and_shutdown_reverses() {
        let mut c = container();
        // Registered out of order on purpose
        c.register(
            ServiceDescriptor::new("shop", shop)
                .provides("shop")
                .requires("economy"),
        )
        .unwrap();
        c.register(ServiceDescriptor::new("storage", storage).provides("storage"))
            .unwrap();
        c.register(
            ServiceDescriptor::new("bank", bank)
                .provides("economy")
                .requires("storage"),
        )
        .unwrap();

        c.initialize().await.unwrap();
        assert_eq!(c.state("storage"), Some(LifecycleState::Enabled));
        assert_eq!(c.state("shop"), Some(LifecycleState::Enabled));

        c.shutdown().await.unwrap();
        assert_eq!(c.state("shop"), Some(LifecycleState::Disabled));

        let events = EVENTS.lock().unwrap();
        let enables: Vec<&str> = events
            .iter()
            .filter(|e| e.starts_with("enable"))
            .map(String::as_str)
            .collect();
        assert_eq!(enables, vec!["enable storage", "enable bank", "enable shop"]);
        let disables: Vec<&str> = events
            .iter()
            .filter(|e| e.starts_with("disable"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            disables,
            vec!["disable shop", "disable bank", "disable storage"]
        );
    }
}

mod lookup {
    use super::*;

    #[derive(Debug)]
    struct EchoService {
        greeting: String,
    }

    #[async_trait::async_trait]
    impl Service for EchoService {
        fn name(&self) -> &str {
            "echo"
        }
    }

    fn echo(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(Arc::new(EchoService {
            greeting: "hello".to_string(),
        }))
    }

    #[tokio::test]
    async fn test_lookup_tracks_lifecycle() {
        let key = CapabilityKey::from("echo");
        let mut c = container();
        c.register(ServiceDescriptor::new("echo", echo).provides("echo"))
            .unwrap();

        // Nothing resolved yet
        assert!(c.lookup(&key).is_none());

        c.initialize().await.unwrap();
        assert!(c.lookup(&key).is_some());

        c.shutdown().await.unwrap();
        assert!(c.lookup(&key).is_none());
    }

    #[tokio::test]
    async fn test_lookup_as_downcasts_to_concrete_type() {
        let key = CapabilityKey::from("echo");
        let mut c = container();
        c.register(ServiceDescriptor::new("echo", echo).provides("echo"))
            .unwrap();
        c.initialize().await.unwrap();

        let service = c.lookup_as::<EchoService>(&key).unwrap();
        assert_eq!(service.greeting, "hello");
    }

    #[tokio::test]
    async fn test_lookup_unknown_capability_is_none() {
        let mut c = container();
        c.register(ServiceDescriptor::new("echo", echo).provides("echo"))
            .unwrap();
        c.initialize().await.unwrap();

        assert!(c.lookup(&CapabilityKey::from("other")).is_none());
    }
}

mod rollback {
    use super::*;

    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn base(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("base", &EVENTS, false))
    }
    fn flaky(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("flaky", &EVENTS, true))
    }

    #[tokio::test]
    async fn test_enable_failure_disables_already_enabled_in_reverse() {
        let mut c = container();
        c.register(ServiceDescriptor::new("base", base).provides("base"))
            .unwrap();
        c.register(
            ServiceDescriptor::new("flaky", flaky)
                .provides("flaky")
                .requires("base"),
        )
        .unwrap();

        let err = c.initialize().await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle { .. }));
        assert!(err.to_string().contains("flaky"));

        assert_eq!(c.state("flaky"), Some(LifecycleState::Failed));
        // The base service was rolled back and is no longer reachable
        assert!(c.lookup(&CapabilityKey::from("base")).is_none());

        let events = EVENTS.lock().unwrap();
        let base_events: Vec<&str> = events
            .iter()
            .filter(|e| e.ends_with("base"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            base_events,
            vec!["construct base", "enable base", "disable base"]
        );
    }
}

mod reload {
    use super::*;

    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn core(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("core", &EVENTS, false))
    }
    fn mid(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("mid", &EVENTS, false))
    }
    fn leaf(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("leaf", &EVENTS, false))
    }
    fn bystander(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(tracked("bystander", &EVENTS, false))
    }

    #[tokio::test]
    async fn test_reload_restarts_transitive_dependents_only() {
        let mut c = container();
        c.register(ServiceDescriptor::new("core", core).provides("core"))
            .unwrap();
        c.register(
            ServiceDescriptor::new("mid", mid)
                .provides("mid")
                .requires("core"),
        )
        .unwrap();
        c.register(
            ServiceDescriptor::new("leaf", leaf)
                .provides("leaf")
                .requires("mid"),
        )
        .unwrap();
        c.register(ServiceDescriptor::new("bystander", bystander).provides("side"))
            .unwrap();

        c.initialize().await.unwrap();
        EVENTS.lock().unwrap().clear();

        c.reload(&CapabilityKey::from("core")).await.unwrap();

        let events = EVENTS.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "disable leaf",
                "disable mid",
                "disable core",
                "construct core",
                "enable core",
                "construct mid",
                "enable mid",
                "construct leaf",
                "enable leaf",
            ]
        );

        assert_eq!(c.state("core"), Some(LifecycleState::Enabled));
        assert_eq!(c.state("bystander"), Some(LifecycleState::Enabled));
        assert!(c.lookup(&CapabilityKey::from("leaf")).is_some());
    }

    #[derive(Debug)]
    struct StubbornService;

    #[async_trait::async_trait]
    impl Service for StubbornService {
        fn name(&self) -> &str {
            "stubborn"
        }

        async fn disable(&self) -> Result<()> {
            Err(Error::internal("disable failure injected"))
        }
    }

    fn stubborn(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(Arc::new(StubbornService))
    }

    #[tokio::test]
    async fn test_reload_marks_service_failed_when_disable_errors() {
        let mut c = container();
        c.register(ServiceDescriptor::new("stubborn", stubborn).provides("stubborn"))
            .unwrap();
        c.initialize().await.unwrap();

        let err = c.reload(&CapabilityKey::from("stubborn")).await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle { .. }));

        // The service is neither enabled nor silently left in limbo
        assert_eq!(c.state("stubborn"), Some(LifecycleState::Failed));
        assert!(c.lookup(&CapabilityKey::from("stubborn")).is_none());
    }

    #[tokio::test]
    async fn test_reload_unknown_capability_fails() {
        let mut c = container();
        assert!(matches!(
            c.reload(&CapabilityKey::from("ghost")).await,
            Err(Error::NotFound { .. })
        ));
    }
}

mod registration_guards {
    use super::*;

    fn solo(_: &ServiceContext) -> Result<Arc<dyn Service>> {
        Ok(Arc::new(TrackedService {
            name: "solo",
            events: {
                static NOWHERE: Mutex<Vec<String>> = Mutex::new(Vec::new());
                &NOWHERE
            },
            fail_enable: false,
        }))
    }

    #[tokio::test]
    async fn test_register_after_initialize_is_rejected() {
        let mut c = container();
        c.register(ServiceDescriptor::new("solo", solo).provides("solo"))
            .unwrap();
        c.initialize().await.unwrap();

        let err = c
            .register(ServiceDescriptor::new("late", solo).provides("late"))
            .unwrap_err();
        assert!(matches!(err, Error::Lifecycle { .. }));
    }

    #[tokio::test]
    async fn test_missing_provider_fails_initialize() {
        let mut c = container();
        c.register(
            ServiceDescriptor::new("bank", solo)
                .provides("economy")
                .requires("storage"),
        )
        .unwrap();

        assert!(matches!(
            c.initialize().await,
            Err(Error::UnresolvedDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_descriptor_rejected_at_registration() {
        let mut c = container();
        let err = c
            .register(ServiceDescriptor::new("nameless", solo))
            .unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
    }
}
