// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates image names at load time.

use serde::Deserialize;

use crate::types::ImageName;

pub fn deserialize_image_name_option<'de, D>(
    deserializer: D,
) -> Result<Option<ImageName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| ImageName::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}
