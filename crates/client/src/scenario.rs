use netdev_store::DeviceInfo;
use reqwest::Method;
use serde::Serialize;

/// JSON body of a scripted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Device(DeviceInfo),
    Devices(Vec<DeviceInfo>),
}

#[derive(Debug, Clone)]
pub struct Step {
    pub title: String,
    pub method: Method,
    pub payload: Option<Payload>,
}

impl Step {
    pub fn new(title: impl Into<String>, method: Method) -> Self {
        Self {
            title: title.into(),
            method,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Ordered list of requests issued against the server.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub fn initial_devices() -> Vec<DeviceInfo> {
    vec![
        DeviceInfo::new("Router-Main", "Router", "192.168.1.1", "Static"),
        DeviceInfo::new("Switch-Core-01", "Switch", "192.168.1.2", "Dynamic"),
        DeviceInfo::new("Server-DB", "Server", "192.168.1.100", "Static"),
        DeviceInfo::new("Firewall-Edge", "Firewall", "10.0.0.1", "BGP"),
        DeviceInfo::new("AP-Office-01", "Access Point", "192.168.2.10", "Static"),
    ]
}

pub fn patch_devices() -> Vec<DeviceInfo> {
    vec![
        DeviceInfo::new("Laptop-Admin", "Client", "192.168.1.150", "DHCP"),
        DeviceInfo::new("Camera-Entrance", "IP Camera", "192.168.3.20", "Static"),
    ]
}

pub fn replacement_devices() -> Vec<DeviceInfo> {
    vec![
        DeviceInfo::new("New-Router", "Router", "10.10.10.1", "OSPF"),
        DeviceInfo::new("New-Switch", "Switch", "10.10.10.2", "Static"),
    ]
}

/// DELETE, five POSTs, GET, PATCH, PUT, GET.
pub fn default_scenario() -> Scenario {
    let mut steps = vec![Step::new(
        "DELETE запит - Очищення лог-файлу",
        Method::DELETE,
    )];

    for device in initial_devices() {
        steps.push(
            Step::new(
                format!("POST запит - Додавання пристрою: {}", device.device_name),
                Method::POST,
            )
            .with_payload(Payload::Device(device)),
        );
    }

    steps.push(Step::new(
        "GET запит - Отримання вмісту лог-файлу",
        Method::GET,
    ));
    steps.push(
        Step::new(
            "PATCH запит - Часткове оновлення (додавання пристроїв)",
            Method::PATCH,
        )
        .with_payload(Payload::Devices(patch_devices())),
    );
    steps.push(
        Step::new("PUT запит - Повне оновлення лог-файлу", Method::PUT)
            .with_payload(Payload::Devices(replacement_devices())),
    );
    steps.push(Step::new(
        "GET запит - Перевірка оновленого вмісту",
        Method::GET,
    ));

    Scenario::new(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_order() {
        let scenario = default_scenario();
        let methods: Vec<&Method> = scenario.steps().iter().map(|step| &step.method).collect();

        assert_eq!(
            methods,
            vec![
                &Method::DELETE,
                &Method::POST,
                &Method::POST,
                &Method::POST,
                &Method::POST,
                &Method::POST,
                &Method::GET,
                &Method::PATCH,
                &Method::PUT,
                &Method::GET,
            ]
        );
    }

    #[test]
    fn bodies_only_on_writes() {
        for step in default_scenario().steps() {
            let expects_body = matches!(step.method, Method::POST | Method::PUT | Method::PATCH);
            assert_eq!(step.payload.is_some(), expects_body, "{}", step.title);
        }
    }

    #[test]
    fn payloads_serialize_as_object_or_array() {
        let single = serde_json::to_value(Payload::Device(initial_devices().remove(0))).unwrap();
        assert_eq!(single["device_name"], "Router-Main");
        assert_eq!(single["routing_type"], "Static");

        let many = serde_json::to_value(Payload::Devices(replacement_devices())).unwrap();
        assert_eq!(many.as_array().map(Vec::len), Some(2));
        assert_eq!(many[1]["ip_address"], "10.10.10.2");
    }

    #[test]
    fn scripted_devices_are_valid() {
        let all = initial_devices()
            .into_iter()
            .chain(patch_devices())
            .chain(replacement_devices());
        for device in all {
            assert!(device.validate().is_ok(), "{device:?}");
        }
    }
}
