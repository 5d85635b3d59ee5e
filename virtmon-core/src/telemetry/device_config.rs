//! Guest device configuration (domain XML) parsing.
//!
//! The XML layout is declared once, in the private `schema` module, as serde
//! structs. Parsing maps that layout into the flat public types the
//! correlator works with. Absent elements and attributes become empty strings.

use thiserror::Error;

/// Guest configuration document could not be decoded.
#[derive(Error, Debug)]
#[error("malformed domain XML: {0}")]
pub struct DescriptorError(#[from] quick_xml::DeError);

/// Declared configuration of one disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskConfig {
    pub target_device: String,
    pub bus: String,
    pub driver_type: String,
    pub cache_mode: String,
    pub discard_mode: String,
    /// `file`, `block`, `network`, ...
    pub disk_type: String,
    pub serial: String,
    pub source_file: String,
    /// Network backend name (e.g. `pool/image` for rbd).
    pub source_name: String,
}

/// Declared configuration of one network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub target_device: String,
    pub source_bridge: String,
    pub virtual_port_id: String,
}

/// Orchestrator-provided metadata (OpenStack Nova instance block).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestMetadata {
    pub instance_name: String,
    pub flavor_name: String,
    pub owner_user_name: String,
    pub owner_user_uuid: String,
    pub owner_project_name: String,
    pub owner_project_uuid: String,
    pub root_type: String,
    pub root_uuid: String,
}

/// Parsed device configuration of one guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub disks: Vec<DiskConfig>,
    pub interfaces: Vec<InterfaceConfig>,
    pub metadata: GuestMetadata,
}

impl DeviceDescriptor {
    /// Parse a domain XML document.
    pub fn from_xml(xml: &str) -> Result<Self, DescriptorError> {
        let domain: schema::Domain = quick_xml::de::from_str(xml)?;
        Ok(domain.into())
    }

    /// First disk whose target device is `target`.
    pub fn find_disk(&self, target: &str) -> Option<&DiskConfig> {
        self.disks.iter().find(|d| d.target_device == target)
    }

    /// First interface whose target device is `target`.
    pub fn find_interface(&self, target: &str) -> Option<&InterfaceConfig> {
        self.interfaces.iter().find(|i| i.target_device == target)
    }
}

mod schema {
    //! Serde layout of the parts of domain XML the exporter reads.
    //! Element names match by local name, so `nova:instance` maps to `instance`.

    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Domain {
        pub devices: Devices,
        pub metadata: Metadata,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Devices {
        #[serde(rename = "disk")]
        pub disks: Vec<Disk>,
        #[serde(rename = "interface")]
        pub interfaces: Vec<Interface>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Disk {
        #[serde(rename = "@type")]
        pub disk_type: String,
        pub driver: DiskDriver,
        pub source: DiskSource,
        pub target: Target,
        pub serial: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct DiskDriver {
        #[serde(rename = "@type")]
        pub driver_type: String,
        #[serde(rename = "@cache")]
        pub cache: String,
        #[serde(rename = "@discard")]
        pub discard: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct DiskSource {
        #[serde(rename = "@file")]
        pub file: String,
        #[serde(rename = "@name")]
        pub name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Target {
        #[serde(rename = "@dev")]
        pub dev: String,
        #[serde(rename = "@bus")]
        pub bus: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Interface {
        pub source: InterfaceSource,
        pub target: Target,
        pub virtualport: VirtualPort,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct InterfaceSource {
        #[serde(rename = "@bridge")]
        pub bridge: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct VirtualPort {
        pub parameters: VirtualPortParameters,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct VirtualPortParameters {
        #[serde(rename = "@interfaceid")]
        pub interface_id: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Metadata {
        pub instance: Instance,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Instance {
        pub name: String,
        pub flavor: Flavor,
        pub owner: Owner,
        pub root: Root,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Flavor {
        #[serde(rename = "@name")]
        pub name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Owner {
        pub user: NamedUuid,
        pub project: NamedUuid,
    }

    /// `<x uuid="...">name</x>`
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct NamedUuid {
        #[serde(rename = "@uuid")]
        pub uuid: String,
        #[serde(rename = "$text")]
        pub name: String,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Root {
        #[serde(rename = "@type")]
        pub root_type: String,
        #[serde(rename = "@uuid")]
        pub uuid: String,
    }
}

impl From<schema::Domain> for DeviceDescriptor {
    fn from(domain: schema::Domain) -> Self {
        let disks = domain
            .devices
            .disks
            .into_iter()
            .map(|d| DiskConfig {
                target_device: d.target.dev,
                bus: d.target.bus,
                driver_type: d.driver.driver_type,
                cache_mode: d.driver.cache,
                discard_mode: d.driver.discard,
                disk_type: d.disk_type,
                serial: d.serial,
                source_file: d.source.file,
                source_name: d.source.name,
            })
            .collect();

        let interfaces = domain
            .devices
            .interfaces
            .into_iter()
            .map(|i| InterfaceConfig {
                target_device: i.target.dev,
                source_bridge: i.source.bridge,
                virtual_port_id: i.virtualport.parameters.interface_id,
            })
            .collect();

        let instance = domain.metadata.instance;
        let metadata = GuestMetadata {
            instance_name: instance.name,
            flavor_name: instance.flavor.name,
            owner_user_name: instance.owner.user.name,
            owner_user_uuid: instance.owner.user.uuid,
            owner_project_name: instance.owner.project.name,
            owner_project_uuid: instance.owner.project.uuid,
            root_type: instance.root.root_type,
            root_uuid: instance.root.uuid,
        };

        DeviceDescriptor { disks, interfaces, metadata }
    }
}
