use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub block_size: u32,
    pub num_circles: u32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            block_size: 20,
            num_circles: 15000,
            min_radius: 1.0,
            max_radius: 5.0,
        }
    }
}
