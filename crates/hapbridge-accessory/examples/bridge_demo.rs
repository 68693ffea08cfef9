/*!
 * Bridge demo
 *
 * Wires configuration, logging, an in-memory registry with simulated devices,
 * the platform and the change dispatcher together, then plays the accessory
 * host: it writes a few characteristics and reacts to devices changing on
 * their own.
 *
 * Run with an optional TOML configuration file:
 *
 * ```text
 * cargo run -p hapbridge-accessory --example bridge_demo -- bridge.toml
 * ```
 *
 * Settings can also come from `HAPBRIDGE__...` environment variables, e.g.
 * `HAPBRIDGE__CONTROLLER__ELK_ENABLED=true`.
 */
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::join_all;
use tokio::time::timeout;
use tracing::info;

use hapbridge_accessory::{
    Accessory, AddressIndex, CharacteristicEvent, CharacteristicKind, Platform,
    SecuritySystemTargetState, Value,
};
use hapbridge_core::config::{Config, ConfigBuilder, IgnoreRule};
use hapbridge_core::event::{EventReceiver, SharedEventBus};
use hapbridge_devices::devices::{
    SimulatedAlarmPanel, SimulatedContactSensor, SimulatedFan, SimulatedLight, SimulatedLock,
    SimulatedOutlet,
};
use hapbridge_devices::{
    AlarmMode, AlarmTripState, DeviceHandle, DeviceInfo, DeviceKind, DeviceRegistry,
    MemoryRegistry, SharedDeviceRegistry,
};

/// Devices the controller of the demo house exposes
struct House {
    registry: Arc<MemoryRegistry>,
    den_light: Arc<SimulatedLight>,
    back_door: Arc<SimulatedContactSensor>,
    alarm: Arc<SimulatedAlarmPanel>,
}

fn build_house() -> anyhow::Result<House> {
    let registry = Arc::new(MemoryRegistry::new());
    let notifier = registry.notifier();

    let den_light = Arc::new(SimulatedLight::new(
        DeviceInfo::new("1F 2E 3D 1", "Den Lamp", DeviceKind::DimmableLight, "LampLinc Dimmer"),
        notifier.clone(),
    ));
    let back_door = Arc::new(SimulatedContactSensor::new(
        DeviceInfo::new(
            "2A 4B 6C 1",
            "Back Door",
            DeviceKind::AlarmDoorWindowSensor,
            "ELK Zone",
        ),
        notifier.clone(),
    ));
    let alarm = Arc::new(SimulatedAlarmPanel::new(
        DeviceInfo::new("ELK 1", "House Alarm", DeviceKind::AlarmPanel, "ELK M1 Gold"),
        notifier.clone(),
    ));

    registry.register_device(DeviceHandle::Light(den_light.clone()))?;
    registry.register_device(DeviceHandle::Light(Arc::new(SimulatedLight::new(
        DeviceInfo::new("1F 2E 3D 2", "Hallway Closet Light", DeviceKind::Light, "SwitchLinc"),
        notifier.clone(),
    ))))?;
    registry.register_device(DeviceHandle::Lock(Arc::new(SimulatedLock::new(
        DeviceInfo::new("3B 1C 5D 1", "Front Door", DeviceKind::SecureLock, "MorningLinc"),
        notifier.clone(),
    ))))?;
    registry.register_device(DeviceHandle::Outlet(Arc::new(SimulatedOutlet::new(
        DeviceInfo::new("4C 2D 6E 1", "Porch Outlet", DeviceKind::Outlet, "OutletLinc"),
        notifier.clone(),
    ))))?;
    registry.register_device(DeviceHandle::Fan(Arc::new(SimulatedFan::new(
        DeviceInfo::new("5D 3E 7F 2", "Bedroom Fan", DeviceKind::Fan, "FanLinc"),
        notifier,
    ))))?;
    registry.register_device(DeviceHandle::ContactSensor(back_door.clone()))?;
    registry.set_alarm_panel(alarm.clone())?;

    Ok(House {
        registry,
        den_light,
        back_door,
        alarm,
    })
}

fn load_config() -> anyhow::Result<Config> {
    let mut builder = ConfigBuilder::new().with_environment_prefix("HAPBRIDGE");
    if let Some(path) = std::env::args().nth(1) {
        builder = builder.with_config_file(path);
    }
    let mut config = builder.build().context("loading configuration")?;

    // Demo defaults when nothing was configured
    if config.ignore_devices.is_empty() {
        config.ignore_devices = vec![IgnoreRule::name_contains("Closet")];
    }
    config.controller.elk_enabled = true;
    Ok(config)
}

async fn next_events(events: &mut EventReceiver<CharacteristicEvent>, count: usize) {
    for _ in 0..count {
        match timeout(Duration::from_secs(1), events.recv()).await {
            Ok(Ok(event)) => info!(
                "host <- {} {}.{} = {:?}",
                event.address, event.service, event.characteristic, event.value
            ),
            Ok(Err(e)) => {
                info!("Event stream error: {}", e);
                return;
            }
            Err(_) => {
                info!("No further events");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    hapbridge_core::init(&config)?;
    hapbridge_accessory::init()?;

    let house = build_house()?;
    let bus = SharedEventBus::new();
    let mut events = bus.subscribe::<CharacteristicEvent>()?;

    let registry: Arc<dyn DeviceRegistry> = house.registry.clone();
    let platform = Platform::new(
        SharedDeviceRegistry::from(registry),
        &config,
        bus.clone(),
        Arc::new(AddressIndex::new()),
    );

    let accessories = platform.enumerate_accessories().await?;
    for accessory in &accessories {
        let services: Vec<String> = accessory
            .services()
            .iter()
            .map(|s| s.kind().to_string())
            .collect();
        info!(
            "{} [{}]: {}",
            accessory.name(),
            accessory.address(),
            services.join(", ")
        );
    }

    let dispatcher = platform
        .dispatcher()
        .spawn(house.registry.subscribe_changes()?);

    // Identify everything at once
    for result in join_all(accessories.iter().map(|a| a.identify())).await {
        result?;
    }

    // The host turns the den lamp down and arms the alarm for the night
    let index = platform.index();
    if let Some(lamp) = index.get("1F 2E 3D 1").await {
        lamp.write(CharacteristicKind::Brightness, Value::Integer(40)).await?;
        lamp.write(CharacteristicKind::Brightness, Value::Integer(40)).await?;
        info!("Den lamp commands: {:?}", house.den_light.commands());
    }
    if let Some(panel) = index.get("ELK 1").await {
        panel
            .write(
                CharacteristicKind::SecuritySystemTargetState,
                Value::from(SecuritySystemTargetState::NightArm.code()),
            )
            .await?;
    }

    // Things happen in the house
    house.den_light.simulate_light(true, 100)?;
    next_events(&mut events, 2).await;

    house.back_door.simulate_door_window(true)?;
    house
        .alarm
        .simulate_alarm(AlarmTripState::Tripped, AlarmMode::Night)?;
    next_events(&mut events, 3).await;

    if let Some(panel) = index.get("ELK 1").await {
        info!(
            "Alarm reads {:?}",
            panel.read(CharacteristicKind::SecuritySystemCurrentState)?
        );
    }

    dispatcher.abort();
    Ok(())
}
