//! Prints the BareMetalHost CRD manifest as YAML
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/baremetalhost.yaml`

use crds::BareMetalHost;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&BareMetalHost::crd())?);
    Ok(())
}
