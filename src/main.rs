#![allow(dead_code)]

mod camera;
mod client;
mod frame;
mod math;
mod projector;
mod scene;
mod settings;
mod vk;

fn main() {
    env_logger::init();
    client::run(settings::Settings::default())
}
