//! Named Vulkan values that show up in trace parameters and structures.
//!
//! Only the handful used by trace checks are listed. Use [`lookup`] to resolve a name.

pub const VK_NULL_HANDLE: u64 = 0;
pub const VK_SUCCESS: u64 = 0;
pub const NON_DISPATCHABLE_HANDLE_SIZE: u64 = 8;

// VkStructureType
pub const VK_STRUCTURE_TYPE_INSTANCE_CREATE_INFO: u64 = 1;
pub const VK_STRUCTURE_TYPE_SEMAPHORE_CREATE_INFO: u64 = 9;
pub const VK_STRUCTURE_TYPE_IMAGE_CREATE_INFO: u64 = 14;
pub const VK_STRUCTURE_TYPE_COMMAND_BUFFER_INHERITANCE_INFO: u64 = 41;
pub const VK_STRUCTURE_TYPE_COMMAND_BUFFER_BEGIN_INFO: u64 = 42;
pub const VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR: u64 = 1_000_001_000;
pub const VK_STRUCTURE_TYPE_ANDROID_SURFACE_CREATE_INFO_KHR: u64 = 1_000_008_000;

// VkImageType
pub const VK_IMAGE_TYPE_1D: u64 = 0;
pub const VK_IMAGE_TYPE_2D: u64 = 1;
pub const VK_IMAGE_TYPE_3D: u64 = 2;

// VkImageCreateFlagBits
pub const VK_IMAGE_CREATE_MUTABLE_FORMAT_BIT: u64 = 0x0000_0008;
pub const VK_IMAGE_CREATE_CUBE_COMPATIBLE_BIT: u64 = 0x0000_0010;

// VkFormat
pub const VK_FORMAT_R8G8B8A8_UNORM: u64 = 37;
pub const VK_FORMAT_D16_UNORM: u64 = 124;

// VkSampleCountFlagBits
pub const VK_SAMPLE_COUNT_1_BIT: u64 = 0x0000_0001;
pub const VK_SAMPLE_COUNT_4_BIT: u64 = 0x0000_0004;

// VkImageTiling
pub const VK_IMAGE_TILING_OPTIMAL: u64 = 0;
pub const VK_IMAGE_TILING_LINEAR: u64 = 1;

// VkImageUsageFlagBits
pub const VK_IMAGE_USAGE_TRANSFER_SRC_BIT: u64 = 0x0000_0001;
pub const VK_IMAGE_USAGE_TRANSFER_DST_BIT: u64 = 0x0000_0002;
pub const VK_IMAGE_USAGE_COLOR_ATTACHMENT_BIT: u64 = 0x0000_0010;
pub const VK_IMAGE_USAGE_DEPTH_STENCIL_ATTACHMENT_BIT: u64 = 0x0000_0020;

// VkSharingMode
pub const VK_SHARING_MODE_EXCLUSIVE: u64 = 0;
pub const VK_SHARING_MODE_CONCURRENT: u64 = 1;

// VkImageLayout
pub const VK_IMAGE_LAYOUT_UNDEFINED: u64 = 0;
pub const VK_IMAGE_LAYOUT_PREINITIALIZED: u64 = 8;

/// Sorted by name for [`lookup`].
static NAMED: &[(&str, u64)] = &[
    ("NON_DISPATCHABLE_HANDLE_SIZE", NON_DISPATCHABLE_HANDLE_SIZE),
    ("VK_FORMAT_D16_UNORM", VK_FORMAT_D16_UNORM),
    ("VK_FORMAT_R8G8B8A8_UNORM", VK_FORMAT_R8G8B8A8_UNORM),
    ("VK_IMAGE_CREATE_CUBE_COMPATIBLE_BIT", VK_IMAGE_CREATE_CUBE_COMPATIBLE_BIT),
    ("VK_IMAGE_CREATE_MUTABLE_FORMAT_BIT", VK_IMAGE_CREATE_MUTABLE_FORMAT_BIT),
    ("VK_IMAGE_LAYOUT_PREINITIALIZED", VK_IMAGE_LAYOUT_PREINITIALIZED),
    ("VK_IMAGE_LAYOUT_UNDEFINED", VK_IMAGE_LAYOUT_UNDEFINED),
    ("VK_IMAGE_TILING_LINEAR", VK_IMAGE_TILING_LINEAR),
    ("VK_IMAGE_TILING_OPTIMAL", VK_IMAGE_TILING_OPTIMAL),
    ("VK_IMAGE_TYPE_1D", VK_IMAGE_TYPE_1D),
    ("VK_IMAGE_TYPE_2D", VK_IMAGE_TYPE_2D),
    ("VK_IMAGE_TYPE_3D", VK_IMAGE_TYPE_3D),
    ("VK_IMAGE_USAGE_COLOR_ATTACHMENT_BIT", VK_IMAGE_USAGE_COLOR_ATTACHMENT_BIT),
    (
        "VK_IMAGE_USAGE_DEPTH_STENCIL_ATTACHMENT_BIT",
        VK_IMAGE_USAGE_DEPTH_STENCIL_ATTACHMENT_BIT,
    ),
    ("VK_IMAGE_USAGE_TRANSFER_DST_BIT", VK_IMAGE_USAGE_TRANSFER_DST_BIT),
    ("VK_IMAGE_USAGE_TRANSFER_SRC_BIT", VK_IMAGE_USAGE_TRANSFER_SRC_BIT),
    ("VK_NULL_HANDLE", VK_NULL_HANDLE),
    ("VK_SAMPLE_COUNT_1_BIT", VK_SAMPLE_COUNT_1_BIT),
    ("VK_SAMPLE_COUNT_4_BIT", VK_SAMPLE_COUNT_4_BIT),
    ("VK_SHARING_MODE_CONCURRENT", VK_SHARING_MODE_CONCURRENT),
    ("VK_SHARING_MODE_EXCLUSIVE", VK_SHARING_MODE_EXCLUSIVE),
    (
        "VK_STRUCTURE_TYPE_ANDROID_SURFACE_CREATE_INFO_KHR",
        VK_STRUCTURE_TYPE_ANDROID_SURFACE_CREATE_INFO_KHR,
    ),
    (
        "VK_STRUCTURE_TYPE_COMMAND_BUFFER_BEGIN_INFO",
        VK_STRUCTURE_TYPE_COMMAND_BUFFER_BEGIN_INFO,
    ),
    (
        "VK_STRUCTURE_TYPE_COMMAND_BUFFER_INHERITANCE_INFO",
        VK_STRUCTURE_TYPE_COMMAND_BUFFER_INHERITANCE_INFO,
    ),
    ("VK_STRUCTURE_TYPE_IMAGE_CREATE_INFO", VK_STRUCTURE_TYPE_IMAGE_CREATE_INFO),
    (
        "VK_STRUCTURE_TYPE_INSTANCE_CREATE_INFO",
        VK_STRUCTURE_TYPE_INSTANCE_CREATE_INFO,
    ),
    (
        "VK_STRUCTURE_TYPE_SEMAPHORE_CREATE_INFO",
        VK_STRUCTURE_TYPE_SEMAPHORE_CREATE_INFO,
    ),
    (
        "VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR",
        VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR,
    ),
    ("VK_SUCCESS", VK_SUCCESS),
];

pub fn lookup(name: &str) -> Option<u64> {
    NAMED
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name))
        .ok()
        .map(|i| NAMED[i].1)
}
