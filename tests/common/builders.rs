//! Test data builders for creating test objects

use properties_exporter::{ConfigSettings, DumpProperty, DumpPropertySpec};

/// Builder for creating test configurations
pub struct ConfigBuilder {
    rules: Vec<(String, String)>,
    dump: Vec<DumpProperty>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            dump: Vec::new(),
        }
    }

    pub fn target(mut self, key: &str, value: &str) -> Self {
        self.rules.push((key.to_string(), value.to_string()));
        self
    }

    pub fn dump(mut self, name: &str) -> Self {
        self.dump.push(DumpProperty::new(name));
        self
    }

    pub fn dump_as(mut self, name: &str, alias: &str) -> Self {
        self.dump.push(DumpProperty::new(name).with_alias(alias));
        self
    }

    pub fn build(self) -> ConfigSettings {
        ConfigSettings {
            target_device_properties: self.rules.into_iter().collect(),
            dump_properties: DumpPropertySpec::new(self.dump),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .target("sys/HardwareName", "Tag")
            .dump_as("temp", "Temperature")
            .dump("volt")
            .build();

        assert_eq!(config.target_device_properties.len(), 1);
        assert_eq!(
            config.dump_properties.header(),
            vec!["Timestamp", "ElapsedTime_ms", "Temperature", "volt"]
        );
    }
}
