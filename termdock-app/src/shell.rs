//! Minimal Win32 shell
//!
//! Stand-in for the external docking library at its consumed boundary: a
//! host frame window plus one plain child container per panel. Tab chrome,
//! drag-and-drop, and the application menu belong to that external
//! capability; this shell only provides containers, z-order raising, and a
//! message pump for the single UI thread.

use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use windows::core::w;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, LoadCursorW,
    PostQuitMessage, RegisterClassExW, SetFocus, TranslateMessage, CW_USEDEFAULT, HMENU,
    IDC_ARROW, MSG, WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_SIZE, WNDCLASSEXW, WS_CHILD,
    WS_CLIPCHILDREN, WS_OVERLAPPEDWINDOW, WS_VISIBLE,
};

use termdock_session::DockState;
use termdock_utils::{Result, TermdockError};

use crate::input::FocusSink;
use crate::manager::DockingHost;
use crate::winsys::{WindowId, WindowSystem};

static RESIZED: AtomicBool = AtomicBool::new(false);
static CLOSE_REQUESTED: AtomicBool = AtomicBool::new(false);

struct ShellState {
    winsys: Arc<dyn WindowSystem>,
    frame: WindowId,
    containers: Mutex<Vec<WindowId>>,
}

/// The host frame window and its panel containers
pub struct Shell {
    state: Arc<ShellState>,
    instance: HINSTANCE,
}

unsafe extern "system" fn container_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

unsafe extern "system" fn frame_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_SIZE => {
            RESIZED.store(true, SeqCst);
            LRESULT(0)
        }
        WM_CLOSE => {
            // shutdown persistence runs before the frame is torn down;
            // the pump destroys the window once the layout is saved
            CLOSE_REQUESTED.store(true, SeqCst);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

impl Shell {
    /// Register the window classes and create the visible host frame
    pub fn create(winsys: Arc<dyn WindowSystem>) -> Result<Self> {
        unsafe {
            let module = GetModuleHandleW(None)
                .map_err(|e| TermdockError::window(format!("GetModuleHandle failed: {}", e)))?;
            let instance: HINSTANCE = module.into();

            let cursor = LoadCursorW(None, IDC_ARROW)
                .map_err(|e| TermdockError::window(format!("LoadCursor failed: {}", e)))?;

            let frame_class = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(frame_proc),
                hInstance: instance,
                hCursor: cursor,
                lpszClassName: w!("TermdockFrame"),
                ..Default::default()
            };
            RegisterClassExW(&frame_class);

            let container_class = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(container_proc),
                hInstance: instance,
                hCursor: cursor,
                lpszClassName: w!("TermdockPanel"),
                ..Default::default()
            };
            RegisterClassExW(&container_class);

            let frame = CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("TermdockFrame"),
                w!("termdock"),
                WS_OVERLAPPEDWINDOW | WS_VISIBLE | WS_CLIPCHILDREN,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                1280,
                800,
                HWND::default(),
                HMENU::default(),
                instance,
                None,
            )
            .map_err(|e| TermdockError::window(format!("frame creation failed: {}", e)))?;

            Ok(Self {
                state: Arc::new(ShellState {
                    winsys,
                    frame: WindowId(frame.0 as isize),
                    containers: Mutex::new(Vec::new()),
                }),
                instance,
            })
        }
    }

    pub fn frame(&self) -> WindowId {
        self.state.frame
    }

    /// Docking-boundary handle for the manager
    pub fn dock_handle(&self) -> ShellDock {
        ShellDock {
            state: self.state.clone(),
            instance: self.instance,
        }
    }

    /// Focus-arbitration sink for the input hook service
    pub fn focus_sink(&self) -> ShellFocus {
        ShellFocus {
            state: self.state.clone(),
        }
    }

    /// Whether the frame was resized since the last call
    pub fn take_resized(&self) -> bool {
        RESIZED.swap(false, SeqCst)
    }

    /// Whether the user asked to close the frame since the last call
    pub fn take_close_requested(&self) -> bool {
        CLOSE_REQUESTED.swap(false, SeqCst)
    }

    /// Fit every container to the frame's client area
    pub fn layout_containers(&self) {
        let client = self.state.winsys.client_rect(self.state.frame);
        for container in self.state.containers.lock().iter() {
            if let Err(e) = self.state.winsys.move_window(*container, client) {
                warn!(?container, "container layout failed: {}", e);
            }
        }
    }

    /// Tear the frame down (ends the message pump via WM_DESTROY)
    pub fn destroy(&self) {
        unsafe {
            let _ = DestroyWindow(HWND(self.state.frame.0 as *mut _));
        }
    }

    /// Block on the next message; false once WM_QUIT arrives
    pub fn pump_one(&self) -> bool {
        let mut msg = MSG::default();
        unsafe {
            if !GetMessageW(&mut msg, None, 0, 0).as_bool() {
                return false;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        true
    }
}

/// [`DockingHost`] implementation handing out plain child containers
pub struct ShellDock {
    state: Arc<ShellState>,
    instance: HINSTANCE,
}

impl DockingHost for ShellDock {
    fn create_container(&mut self, _title: &str, _dock_state: DockState) -> Result<WindowId> {
        let client = self.state.winsys.client_rect(self.state.frame);
        let container = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("TermdockPanel"),
                w!(""),
                WS_CHILD | WS_VISIBLE | WS_CLIPCHILDREN,
                0,
                0,
                client.width,
                client.height,
                HWND(self.state.frame.0 as *mut _),
                HMENU::default(),
                self.instance,
                None,
            )
            .map_err(|e| TermdockError::window(format!("container creation failed: {}", e)))?
        };

        let id = WindowId(container.0 as isize);
        self.state.containers.lock().push(id);
        Ok(id)
    }

    fn remove_container(&mut self, container: WindowId) {
        self.state.containers.lock().retain(|c| *c != container);
        unsafe {
            let _ = DestroyWindow(HWND(container.0 as *mut _));
        }
    }
}

/// [`FocusSink`] implementation over the shell chrome. The minimal shell
/// carries no menu, so menu actions reduce to no-ops while z-order and
/// dock focus behave as in the full chrome.
pub struct ShellFocus {
    state: Arc<ShellState>,
}

impl FocusSink for ShellFocus {
    fn surface_menu(&self) {
        // menu chrome belongs to the external docking capability
    }

    fn raise_host(&self) {
        self.state.winsys.set_foreground(self.state.frame);
    }

    fn focus_dock(&self) {
        unsafe {
            let _ = SetFocus(HWND(self.state.frame.0 as *mut _));
        }
    }

    fn pointer_over_menu(&self) -> bool {
        false
    }
}
