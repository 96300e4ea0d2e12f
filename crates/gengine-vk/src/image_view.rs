// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::driver::DeviceDriver;
use crate::error::{BootstrapError, Result};

/// Creates one 2D colour view per image and appends it to `views`.
///
/// Stops at the first failure without undoing earlier views; they are already
/// in `views`, so whoever owns that vector releases them.
pub fn create_image_views<D: DeviceDriver>(
    device: &D,
    images: &[vk::Image],
    format: vk::Format,
    views: &mut Vec<vk::ImageView>,
) -> Result<()> {
    views.reserve(images.len());
    for (index, &image) in images.iter().enumerate() {
        let view = device
            .create_image_view(image, format)
            .map_err(|result| BootstrapError::ImageViewCreationFailed { index, result })?;
        views.push(view);
    }
    Ok(())
}

/// Identity swizzle, colour aspect, one mip level, one array layer.
pub fn color_view_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
}
