use std::env;

fn main() {
    // MAVLink identity of this tracker, used when no parameter overrides it

    // System ID (default: 1)
    if let Ok(sysid) = env::var("MAVLINK_SYSTEM_ID") {
        println!("cargo:rustc-env=MAVLINK_SYSTEM_ID={}", sysid);
        println!(
            "cargo:warning=Using MAVLINK_SYSTEM_ID from environment: {}",
            sysid
        );
    } else {
        println!("cargo:rustc-env=MAVLINK_SYSTEM_ID=1");
    }

    // Component ID (default: 1, MAV_COMP_ID_AUTOPILOT1)
    if let Ok(compid) = env::var("MAVLINK_COMPONENT_ID") {
        println!("cargo:rustc-env=MAVLINK_COMPONENT_ID={}", compid);
        println!(
            "cargo:warning=Using MAVLINK_COMPONENT_ID from environment: {}",
            compid
        );
    } else {
        println!("cargo:rustc-env=MAVLINK_COMPONENT_ID=1");
    }

    println!("cargo:rerun-if-env-changed=MAVLINK_SYSTEM_ID");
    println!("cargo:rerun-if-env-changed=MAVLINK_COMPONENT_ID");
}
