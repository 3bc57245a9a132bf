//! Web UI assets served inline.
//!
//! The page is a single HTML document with its CSS and JS embedded, so the
//! binary needs no static files next to it.

/// Returns the main web UI HTML page.
#[must_use]
pub const fn index_html() -> &'static str {
    r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="theme-color" content="#1a1a2e">
<link rel="icon" href="/icon.svg" type="image/svg+xml">
<title>YouTube Video/Audio Downloader</title>
<style>
:root {
  --bg: #1a1a2e;
  --bg2: #16213e;
  --bg3: #0f3460;
  --fg: #e0e0e0;
  --fg2: #a0a0b0;
  --accent: #e94560;
  --green: #4caf50;
  --yellow: #ffc107;
  --red: #ef5350;
  --cyan: #00bcd4;
  --radius: 8px;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
  background: var(--bg);
  color: var(--fg);
  min-height: 100vh;
  display: flex;
  flex-direction: column;
}
.header {
  background: var(--bg2);
  padding: 12px 16px;
  border-bottom: 1px solid var(--bg3);
}
.header h1 { font-size: 1.1rem; color: var(--cyan); font-weight: 700; }
.header .sub { font-size: 0.75rem; color: var(--fg2); margin-top: 2px; }
main { width: 100%; max-width: 640px; margin: 0 auto; padding: 16px; }
.section { margin-bottom: 16px; }
.section label.title {
  display: block;
  font-size: 0.8rem;
  color: var(--fg2);
  margin-bottom: 6px;
}
input[type=text], select, textarea {
  width: 100%;
  background: var(--bg2);
  color: var(--fg);
  border: 1px solid var(--bg3);
  border-radius: var(--radius);
  padding: 12px;
  font-size: 16px;
  outline: none;
  font-family: inherit;
}
input[type=text]:focus, select:focus, textarea:focus { border-color: var(--cyan); }
textarea { min-height: 72px; resize: vertical; font-family: monospace; }
.modes { display: flex; flex-wrap: wrap; gap: 8px; }
.modes label {
  flex: 1;
  min-width: 120px;
  background: var(--bg2);
  border: 1px solid var(--bg3);
  border-radius: var(--radius);
  padding: 10px;
  font-size: 0.85rem;
  cursor: pointer;
  display: flex;
  align-items: center;
  gap: 6px;
}
.modes label.checked { border-color: var(--cyan); color: var(--cyan); }
.folder-row { display: flex; gap: 8px; }
.folder-row button { flex: 0 0 auto; }
.message {
  border-radius: var(--radius);
  padding: 10px 12px;
  font-size: 0.85rem;
  margin-bottom: 16px;
  display: none;
}
.message.info { display: block; background: rgba(0,188,212,0.12); border: 1px solid var(--cyan); }
.message.success { display: block; background: rgba(76,175,80,0.15); border: 1px solid var(--green); }
.message.warning { display: block; background: rgba(255,193,7,0.12); border: 1px solid var(--yellow); }
.message.error { display: block; background: rgba(239,83,80,0.15); border: 1px solid var(--red); }
.progress-bar-outer {
  background: var(--bg3);
  border-radius: var(--radius);
  height: 28px;
  overflow: hidden;
  position: relative;
}
.progress-bar-inner {
  background: var(--green);
  height: 100%;
  transition: width 0.3s ease;
  border-radius: var(--radius);
}
.progress-label {
  position: absolute;
  top: 0; left: 0; right: 0; bottom: 0;
  display: flex;
  align-items: center;
  justify-content: center;
  font-size: 0.8rem;
  font-weight: 600;
  color: #fff;
  text-shadow: 0 1px 2px rgba(0,0,0,0.5);
}
.status-line { font-size: 0.8rem; color: var(--fg2); margin-top: 6px; min-height: 1.2em; }
.files { font-size: 0.8rem; color: var(--fg2); margin-top: 6px; }
.files div { white-space: nowrap; overflow: hidden; text-overflow: ellipsis; }
.controls { display: flex; gap: 8px; }
button {
  background: var(--bg3);
  color: var(--fg);
  border: none;
  border-radius: var(--radius);
  padding: 12px;
  font-size: 0.85rem;
  cursor: pointer;
  min-height: 44px;
  font-weight: 500;
}
button:disabled { opacity: 0.4; cursor: default; }
.controls button { flex: 1; }
button.primary { background: var(--accent); color: #fff; font-weight: 600; }
button.pause { background: var(--yellow); color: #000; }
button.resume { background: var(--green); color: #fff; }
button.cancel { border: 1px solid var(--red); color: var(--red); background: transparent; }
.hidden { display: none; }
.toast {
  position: fixed;
  bottom: 24px;
  left: 50%;
  transform: translateX(-50%);
  background: var(--green);
  color: #fff;
  padding: 12px 20px;
  border-radius: var(--radius);
  font-weight: 600;
  box-shadow: 0 4px 16px rgba(0,0,0,0.4);
  opacity: 0;
  transition: opacity 0.3s ease;
  pointer-events: none;
  z-index: 100;
}
.toast.show { opacity: 1; }
.conn-badge {
  position: fixed;
  top: 12px;
  right: 12px;
  background: var(--red);
  color: #fff;
  padding: 6px 12px;
  border-radius: var(--radius);
  font-size: 0.75rem;
  font-weight: 600;
  display: none;
}
.conn-badge.show { display: block; }
</style>
</head>
<body>
<div class="header">
  <h1>YouTube Video/Audio Downloader</h1>
  <div class="sub">Download videos or extract audio with yt-dlp</div>
</div>
<main>
  <div class="message" id="message"></div>
  <form id="download-form">
    <div class="section">
      <label class="title" for="url">Video URL</label>
      <input type="text" id="url" placeholder="https://www.youtube.com/watch?v=..." autocomplete="off" autocapitalize="off" spellcheck="false">
    </div>
    <div class="section">
      <label class="title">Download type</label>
      <div class="modes" id="modes">
        <label class="checked"><input type="radio" name="mode" value="video" checked> Video</label>
        <label><input type="radio" name="mode" value="audio"> Audio</label>
        <label><input type="radio" name="mode" value="best_quality"> Best Quality</label>
        <label><input type="radio" name="mode" value="custom_command"> Custom Command</label>
      </div>
    </div>
    <div class="section" id="opt-video">
      <label class="title" for="video-quality">Video quality</label>
      <select id="video-quality">
        <option value="1080p">1080p</option>
        <option value="720p" selected>720p</option>
        <option value="480p">480p</option>
        <option value="360p">360p</option>
        <option value="240p">240p</option>
        <option value="144p">144p</option>
      </select>
    </div>
    <div class="section hidden" id="opt-audio">
      <label class="title" for="audio-format">Audio format</label>
      <select id="audio-format">
        <option value="mp3" selected>mp3</option>
        <option value="wav">wav</option>
        <option value="aac">aac</option>
        <option value="flac">flac</option>
        <option value="m4a">m4a</option>
      </select>
    </div>
    <div class="section hidden" id="opt-custom">
      <label class="title" for="custom-flags">Custom yt-dlp options</label>
      <textarea id="custom-flags" placeholder="--embed-thumbnail --embed-metadata"></textarea>
    </div>
    <div class="section">
      <label class="title" for="folder">Output folder</label>
      <div class="folder-row">
        <input type="text" id="folder" autocomplete="off" spellcheck="false">
        <button type="button" id="btn-folder">Set folder</button>
      </div>
    </div>
    <div class="section">
      <div class="progress-bar-outer">
        <div class="progress-bar-inner" id="progress-bar" style="width:0%"></div>
        <div class="progress-label" id="progress-label">0%</div>
      </div>
      <div class="status-line" id="status-line"></div>
      <div class="files" id="files"></div>
    </div>
    <div class="controls">
      <button type="submit" class="primary" id="btn-download">Download</button>
      <button type="button" class="pause" id="btn-pause" disabled>Pause</button>
      <button type="button" class="cancel" id="btn-cancel" disabled>Cancel</button>
    </div>
  </form>
</main>
<div class="toast" id="toast"></div>
<div class="conn-badge" id="conn-badge">Disconnected</div>
<script>
(function() {
  'use strict';

  const API = '';  // same origin
  const SEEN_KEY = 'ytdl-web-notified';
  let evtSource = null;
  let reconnectTimer = null;
  let folderDirty = false;
  let firstSnapshot = true;

  function $(id) { return document.getElementById(id); }

  // ---- SSE connection ----
  function connect() {
    if (evtSource) evtSource.close();
    evtSource = new EventSource(API + '/api/events');
    evtSource.onmessage = function(e) {
      try {
        render(JSON.parse(e.data));
        $('conn-badge').classList.remove('show');
      } catch(err) { console.error('SSE parse error', err); }
    };
    evtSource.onerror = function() {
      $('conn-badge').classList.add('show');
      evtSource.close();
      clearTimeout(reconnectTimer);
      reconnectTimer = setTimeout(connect, 3000);
    };
  }

  // ---- Rendering ----
  function render(s) {
    const msg = $('message');
    if (s.message) {
      msg.className = 'message ' + s.message.level;
      msg.textContent = s.message.text;
    } else {
      msg.className = 'message';
      msg.textContent = '';
    }

    $('progress-bar').style.width = s.percent + '%';
    $('progress-label').textContent = s.percent + '%';
    $('status-line').textContent = s.status || '';
    $('files').innerHTML = s.saved_files.map(function(f) {
      return '<div>' + escHtml(f) + '</div>';
    }).join('');

    if (!folderDirty && document.activeElement !== $('folder')) {
      $('folder').value = s.output_folder;
    }

    const active = s.phase === 'running' || s.phase === 'paused';
    $('btn-download').disabled = active;
    $('btn-cancel').disabled = !active;
    const btnPause = $('btn-pause');
    btnPause.disabled = !active;
    if (s.phase === 'paused') {
      btnPause.textContent = 'Resume';
      btnPause.className = 'resume';
    } else {
      btnPause.textContent = 'Pause';
      btnPause.className = 'pause';
    }

    // a result that predates this page was already announced elsewhere
    if (s.notification) {
      if (firstSnapshot) markSeen(s.notification.id);
      else notify(s.notification);
    }
    firstSnapshot = false;
  }

  function escHtml(s) {
    return s.replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/'/g,'&#39;').replace(/"/g,'&quot;');
  }

  // ---- Notifications ----
  function seen(id) {
    try { return localStorage.getItem(SEEN_KEY) === id; } catch(e) { return false; }
  }

  function markSeen(id) {
    try { localStorage.setItem(SEEN_KEY, id); } catch(e) {}
  }

  function showToast(text) {
    const toast = $('toast');
    toast.textContent = text;
    toast.classList.add('show');
    setTimeout(function() { toast.classList.remove('show'); }, 4000);
  }

  function notify(n) {
    if (seen(n.id)) return;
    markSeen(n.id);
    showToast(n.title + ' ' + n.body);
    if (!('Notification' in window)) return;
    if (Notification.permission === 'granted') {
      new Notification(n.title, { body: n.body, icon: '/icon.svg', tag: n.id });
    } else if (Notification.permission !== 'denied') {
      Notification.requestPermission();
    }
  }

  // ---- Actions ----
  function post(path, body) {
    return fetch(API + path, {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify(body || {})
    });
  }

  function selectedMode() {
    return document.querySelector('input[name=mode]:checked').value;
  }

  function showOptions() {
    const mode = selectedMode();
    $('opt-video').classList.toggle('hidden', mode !== 'video');
    $('opt-audio').classList.toggle('hidden', mode !== 'audio');
    $('opt-custom').classList.toggle('hidden', mode !== 'custom_command');
    document.querySelectorAll('#modes label').forEach(function(l) {
      l.classList.toggle('checked', l.querySelector('input').checked);
    });
  }

  document.querySelectorAll('input[name=mode]').forEach(function(r) {
    r.addEventListener('change', showOptions);
  });

  $('folder').addEventListener('input', function() { folderDirty = true; });
  $('btn-folder').addEventListener('click', function() {
    post('/api/folder', { folder: $('folder').value }).then(function() { folderDirty = false; });
  });

  $('download-form').addEventListener('submit', function(e) {
    e.preventDefault();
    const mode = selectedMode();
    const body = { url: $('url').value, mode: mode };
    if (mode === 'video') body.video_quality = $('video-quality').value;
    if (mode === 'audio') body.audio_format = $('audio-format').value;
    if (mode === 'custom_command') body.custom_flags = $('custom-flags').value;
    if ('Notification' in window && Notification.permission === 'default') {
      Notification.requestPermission();
    }
    post('/api/download', body);
  });

  $('btn-pause').addEventListener('click', function() { post('/api/pause'); });
  $('btn-cancel').addEventListener('click', function() { post('/api/cancel'); });

  showOptions();
  connect();
})();
</script>
</body>
</html>"##
}

/// Returns the SVG favicon.
#[must_use]
pub const fn icon_svg() -> &'static str {
    r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 192 192">
  <rect width="192" height="192" rx="32" fill="#1a1a2e"/>
  <g transform="translate(96,96)">
    <rect x="-62" y="-42" width="124" height="84" rx="20" fill="none" stroke="#00bcd4" stroke-width="6"/>
    <path d="M-14,-22 L22,0 L-14,22 Z" fill="#e94560"/>
  </g>
</svg>"##
}
