//! Win32 backend for [`WindowSystem`]
//!
//! Thin call-through wrappers; no state lives here. Handles cross the
//! boundary as raw `isize` values inside [`WindowId`].

use termdock_utils::{Result, TermdockError};

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    GetClassNameW, GetClientRect, GetForegroundWindow, GetParent, GetWindowLongPtrW,
    GetWindowRect, GetWindowThreadProcessId, IsIconic, IsWindow, IsWindowVisible, IsZoomed,
    MoveWindow, PostMessageW, SetForegroundWindow, SetParent, SetWindowLongPtrW, ShowWindow,
    EnumWindows, GWL_STYLE, SW_MAXIMIZE, WM_NULL, WM_SYSCOMMAND,
};

use super::{FrameState, Rect, WindowId, WindowSystem};

fn hwnd(window: WindowId) -> HWND {
    HWND(window.0 as *mut core::ffi::c_void)
}

fn window_id(handle: HWND) -> WindowId {
    WindowId(handle.0 as isize)
}

/// Live Win32 window system
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

struct EnumTarget {
    pid: u32,
    found: Vec<WindowId>,
}

unsafe extern "system" fn enum_proc(handle: HWND, lparam: LPARAM) -> BOOL {
    let target = &mut *(lparam.0 as *mut EnumTarget);
    let mut pid = 0u32;
    GetWindowThreadProcessId(handle, Some(&mut pid));
    if pid == target.pid {
        target.found.push(window_id(handle));
    }
    TRUE
}

impl WindowSystem for Win32WindowSystem {
    fn top_level_windows_of(&self, pid: u32) -> Vec<WindowId> {
        let mut target = EnumTarget { pid, found: Vec::new() };
        // SAFETY: the callback only runs during this call; the pointer
        // stays valid for its duration.
        unsafe {
            let _ = EnumWindows(
                Some(enum_proc),
                LPARAM(&mut target as *mut EnumTarget as isize),
            );
        }
        target.found
    }

    fn class_name(&self, window: WindowId) -> String {
        let mut buf = [0u16; 256];
        let len = unsafe { GetClassNameW(hwnd(window), &mut buf) };
        if len <= 0 {
            return String::new();
        }
        String::from_utf16_lossy(&buf[..len as usize])
    }

    fn is_window(&self, window: WindowId) -> bool {
        unsafe { IsWindow(hwnd(window)).as_bool() }
    }

    fn parent(&self, window: WindowId) -> Option<WindowId> {
        unsafe { GetParent(hwnd(window)) }
            .ok()
            .filter(|h| !h.0.is_null())
            .map(window_id)
    }

    fn set_parent(&self, child: WindowId, parent: WindowId) -> Result<()> {
        unsafe { SetParent(hwnd(child), hwnd(parent)) }
            .map(|_| ())
            .map_err(|e| TermdockError::window(format!("SetParent failed: {}", e)))
    }

    fn detach(&self, child: WindowId) -> Result<()> {
        unsafe { SetParent(hwnd(child), HWND::default()) }
            .map(|_| ())
            .map_err(|e| TermdockError::window(format!("SetParent(desktop) failed: {}", e)))
    }

    fn show_maximized(&self, window: WindowId) {
        unsafe {
            let _ = ShowWindow(hwnd(window), SW_MAXIMIZE);
        }
    }

    fn style(&self, window: WindowId) -> u32 {
        unsafe { GetWindowLongPtrW(hwnd(window), GWL_STYLE) as u32 }
    }

    fn set_style(&self, window: WindowId, style: u32) {
        unsafe {
            SetWindowLongPtrW(hwnd(window), GWL_STYLE, style as isize);
        }
    }

    fn move_window(&self, window: WindowId, bounds: Rect) -> Result<()> {
        unsafe {
            MoveWindow(
                hwnd(window),
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                true,
            )
        }
        .map_err(|e| TermdockError::window(format!("MoveWindow failed: {}", e)))
    }

    fn client_rect(&self, window: WindowId) -> Rect {
        let mut rect = RECT::default();
        unsafe {
            let _ = GetClientRect(hwnd(window), &mut rect);
        }
        Rect::of_size(rect.right - rect.left, rect.bottom - rect.top)
    }

    fn window_rect(&self, window: WindowId) -> Rect {
        let mut rect = RECT::default();
        unsafe {
            let _ = GetWindowRect(hwnd(window), &mut rect);
        }
        Rect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        )
    }

    fn frame_state(&self, window: WindowId) -> FrameState {
        unsafe {
            if IsIconic(hwnd(window)).as_bool() {
                FrameState::Minimized
            } else if IsZoomed(hwnd(window)).as_bool() {
                FrameState::Maximized
            } else {
                FrameState::Normal
            }
        }
    }

    fn is_visible(&self, window: WindowId) -> bool {
        unsafe { IsWindowVisible(hwnd(window)).as_bool() }
    }

    fn foreground_window(&self) -> Option<WindowId> {
        let handle = unsafe { GetForegroundWindow() };
        (!handle.0.is_null()).then(|| window_id(handle))
    }

    fn set_foreground(&self, window: WindowId) -> bool {
        unsafe { SetForegroundWindow(hwnd(window)).as_bool() }
    }

    fn post_system_command(&self, window: WindowId, command: u32) {
        unsafe {
            let _ = PostMessageW(hwnd(window), WM_SYSCOMMAND, WPARAM(command as usize), LPARAM(0));
        }
    }

    fn post_wake(&self, window: WindowId) {
        unsafe {
            let _ = PostMessageW(hwnd(window), WM_NULL, WPARAM(0), LPARAM(0));
        }
    }
}
