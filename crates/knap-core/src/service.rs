/// Desired state of a deployable service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub service_account: String,
    concurrency_token: Option<String>,
}

impl ServiceDescriptor {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        image: impl Into<String>,
        service_account: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            image: image.into(),
            service_account: service_account.into(),
            concurrency_token: None,
        }
    }

    /// Attach the concurrency token observed in the store.
    pub fn observed(mut self, concurrency_token: Option<String>) -> Self {
        self.concurrency_token = concurrency_token;
        self
    }

    pub fn concurrency_token(&self) -> Option<&str> {
        self.concurrency_token.as_deref()
    }

    /// Overwrite the container image and service account. Other fields of
    /// the stored object are not merged.
    pub fn replace_container(&mut self, image: &str, service_account: &str) {
        self.image = image.to_owned();
        self.service_account = service_account.to_owned();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceStatusSnapshot {
    pub latest_ready_revision_name: String,
    pub url: String,
    /// Older serving releases only report the domain.
    pub deprecated_domain: String,
}

impl ServiceStatusSnapshot {
    pub fn is_ready(&self) -> bool {
        !self.latest_ready_revision_name.is_empty()
    }

    /// The service URL, falling back to the deprecated domain field.
    pub fn resolved_url(&self) -> &str {
        if self.url.is_empty() {
            &self.deprecated_domain
        } else {
            &self.url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_url_prefers_primary_field() {
        let status = ServiceStatusSnapshot {
            latest_ready_revision_name: "demo-00001".to_owned(),
            url: "http://demo.default.example.com".to_owned(),
            deprecated_domain: "demo.default.example.com".to_owned(),
        };
        assert_eq!(status.resolved_url(), "http://demo.default.example.com");
    }

    #[test]
    fn resolved_url_falls_back_to_domain() {
        let status = ServiceStatusSnapshot {
            latest_ready_revision_name: "demo-00001".to_owned(),
            url: String::new(),
            deprecated_domain: "svc.example.com".to_owned(),
        };
        assert_eq!(status.resolved_url(), "svc.example.com");
    }

    #[test]
    fn readiness_follows_latest_ready_revision() {
        assert!(!ServiceStatusSnapshot::default().is_ready());
    }

    #[test]
    fn replace_container_overwrites_fields() {
        let mut svc = ServiceDescriptor::new("demo", "default", "reg/demo:1.0", "old")
            .observed(Some("42".to_owned()));
        svc.replace_container("reg/demo:2.0", "builder");

        assert_eq!(svc.image, "reg/demo:2.0");
        assert_eq!(svc.service_account, "builder");
        assert_eq!(svc.concurrency_token(), Some("42"));
    }
}
